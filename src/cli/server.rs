use clap::Parser;
use log::info;
use tokio::net::TcpListener;

use crate::cli::{SubCommandExtend, open_pipeline};
use crate::config::{DEFAULT_SEARCH_LIMIT, OpenAiOptions};
use crate::{Opts, server};

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    #[command(flatten)]
    pub openai: OpenAiOptions,
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
    /// 默认返回的搜索结果数量
    #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_SEARCH_LIMIT)]
    pub limit: usize,
    /// 描述生成失败时仍把错误信息写入向量库
    #[arg(long)]
    pub index_failures: bool,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let pipeline = open_pipeline(&opts.data_dir, &self.openai, self.index_failures)?;
        pipeline.store().ensure_collection().await?;
        tokio::fs::create_dir_all(pipeline.upload_dir()).await?;

        // 创建应用状态
        let state = server::AppState::new(pipeline, self.limit);

        // 创建应用
        let app = server::create_app(state);

        // 启动服务器
        info!("服务器启动：http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
