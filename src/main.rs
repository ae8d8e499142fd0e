use clap::Parser;
use env_logger::Env;
use log::debug;

use picfind::cli::SubCommandExtend;
use picfind::config::{Opts, SubCommand};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenv::dotenv();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Ok(path) = dotenv {
        debug!("已加载环境变量文件 {}", path.display());
    }

    let opts = Opts::parse();

    match &opts.subcmd {
        SubCommand::Add(config) => config.run(&opts).await,
        SubCommand::Search(config) => config.run(&opts).await,
        SubCommand::Server(config) => config.run(&opts).await,
        SubCommand::Reset(config) => config.run(&opts).await,
        SubCommand::Info(config) => config.run(&opts).await,
    }
}
