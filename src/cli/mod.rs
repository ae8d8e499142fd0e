mod add;
mod info;
mod reset;
mod search;
pub mod server;

pub use add::*;
pub use info::*;
pub use reset::*;
pub use search::*;
pub use server::*;

use crate::config::{COLLECTION_NAME, DataDir, OpenAiOptions, Opts};
use crate::embed::EMBEDDING_DIM;
use crate::openai::OpenAiClient;
use crate::pipeline::{FailurePolicy, Pipeline};
use crate::store::{CollectionConfig, Distance, VectorStore};

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}

/// 打开数据目录下的向量集合
pub fn open_store(data_dir: &DataDir) -> VectorStore {
    let config = CollectionConfig { size: EMBEDDING_DIM, distance: Distance::Cosine };
    VectorStore::new(data_dir.vectors(), COLLECTION_NAME, config)
}

/// 创建使用 OpenAI 接口的索引与搜索流程
pub fn open_pipeline(
    data_dir: &DataDir,
    openai: &OpenAiOptions,
    index_failures: bool,
) -> anyhow::Result<Pipeline<OpenAiClient>> {
    let client = OpenAiClient::new(openai)?;
    let policy = if index_failures { FailurePolicy::Index } else { FailurePolicy::Skip };
    Ok(Pipeline::new(client, open_store(data_dir), data_dir.uploads()).policy(policy))
}
