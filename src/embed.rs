//! 文本向量化

use log::debug;

use crate::describe::STATS_MARKER;
use crate::openai::*;

/// 向量化使用的模型
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// 向量维度，需要与向量集合配置一致
pub const EMBEDDING_DIM: usize = 1536;

/// 去掉描述末尾的统计信息，只保留语义内容
pub fn strip_stats(text: &str) -> &str {
    match text.find(STATS_MARKER) {
        Some(pos) => text[..pos].trim_end(),
        None => text,
    }
}

pub trait Embedder {
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, ModelError>> + Send;
}

impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let input = strip_stats(text);
        debug!("向量化文本，{} 字符", input.chars().count());
        let request = EmbeddingRequest { model: EMBEDDING_MODEL, input };
        let response = self.embeddings(&request).await?;
        response.data.into_iter().next().map(|d| d.embedding).ok_or(ModelError::EmptyResponse)
    }
}
