use anyhow::Result;
use clap::Parser;

use crate::Opts;
use crate::cli::{SubCommandExtend, open_store};

#[derive(Parser, Debug, Clone)]
pub struct InfoCommand {}

impl SubCommandExtend for InfoCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let store = open_store(&opts.data_dir);
        match store.get_collection().await {
            Ok(info) => {
                println!("name:     {}", info.name);
                println!("size:     {}", info.config.size);
                println!("distance: {:?}", info.config.distance);
                println!("points:   {}", info.points_count);
            }
            Err(e) if e.is_not_found() => println!("集合 {} 尚未创建", store.name()),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}
