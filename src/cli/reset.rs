use anyhow::Result;
use clap::Parser;
use log::info;

use crate::Opts;
use crate::cli::{SubCommandExtend, open_store};

#[derive(Parser, Debug, Clone)]
pub struct ResetCommand {}

impl SubCommandExtend for ResetCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let store = open_store(&opts.data_dir);
        info!("正在重置向量库……");
        let info = store.reset().await?;
        info!("重置完成");
        println!("{}\t{}", info.name, info.points_count);
        Ok(())
    }
}
