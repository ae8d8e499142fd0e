use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;

use crate::cli::{SubCommandExtend, open_pipeline};
use crate::config::{DEFAULT_SEARCH_LIMIT, OpenAiOptions, Opts};
use crate::store::ScoredPoint;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub openai: OpenAiOptions,
    /// 描述要找的图片
    pub query: String,
    /// 显示的结果数量
    #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_SEARCH_LIMIT)]
    pub limit: usize,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let pipeline = open_pipeline(&opts.data_dir, &self.openai, false)?;
        let result = pipeline.search(&self.query, self.limit).await?;
        if result.is_empty() {
            info!("向量库中没有结果");
        }
        print_result(&result, self)
    }
}

fn print_result(result: &[ScoredPoint], opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?)
        }
        OutputFormat::Table => {
            for hit in result {
                println!("{:.4}\t{}\t{}", hit.score, hit.payload.model, hit.payload.path);
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}
