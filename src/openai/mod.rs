//! OpenAI 兼容接口客户端
//!
//! 只实现本项目用到的两个接口：多模态 Chat Completions 与 Embeddings。

mod types;

use std::time::Duration;

use log::debug;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use self::types::*;
use crate::config::OpenAiOptions;

/// 调用模型接口时可能出现的错误
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("读取图片失败: {0}")]
    Image(#[from] std::io::Error),
    #[error("请求失败: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("接口返回错误 {status}: {message}")]
    Api { status: u16, message: String },
    #[error("接口响应中没有结果")]
    EmptyResponse,
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(opts: &OpenAiOptions) -> anyhow::Result<Self> {
        if opts.api_key.is_empty() {
            return Err(anyhow::anyhow!("OPENAI_API_KEY 不能为空"));
        }
        let client = Client::builder().timeout(Duration::from_secs(opts.timeout)).build()?;
        Ok(Self {
            client,
            api_key: opts.api_key.clone(),
            base_url: opts.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 调用 Chat Completions 接口
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ModelError> {
        debug!("发送 chat 请求，模型: {}", request.model);
        self.post("chat/completions", request).await
    }

    /// 调用 Embeddings 接口
    pub async fn embeddings(
        &self,
        request: &EmbeddingRequest<'_>,
    ) -> Result<EmbeddingResponse, ModelError> {
        debug!("发送 embedding 请求，模型: {}", request.model);
        self.post("embeddings", request).await
    }

    async fn post<T, R>(&self, path: &str, body: &T) -> Result<R, ModelError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(body) => body.error.message,
                Err(_) => text,
            };
            return Err(ModelError::Api { status: status.as_u16(), message });
        }

        Ok(response.json().await?)
    }
}
