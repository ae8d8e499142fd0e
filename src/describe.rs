//! 使用多模态模型为图片生成文字描述

use std::fmt;
use std::path::Path;

use log::{debug, info};

use crate::openai::*;
use crate::utils::image_data_url;

/// 发送给模型的固定提示词
pub const PROMPT: &str = "Describe this photo briefly and concretely. Focus on the facts.";
/// 可选的生成模型
pub const SUPPORTED_MODELS: [&str; 6] =
    ["gpt-4o-mini", "gpt-4o", "gpt-5-mini", "gpt-5", "gpt-5.1", "gpt-5.2"];
/// 单次生成的最大输出 token 数
pub const MAX_OUTPUT_TOKENS: u32 = 400;
/// 传统模型使用的采样温度
pub const TEMPERATURE: f32 = 0.7;
/// 统计信息后缀的起始标记，向量化前会从这里截断
pub const STATS_MARKER: &str = "[Stats |";

pub fn is_supported_model(model: &str) -> bool {
    SUPPORTED_MODELS.contains(&model)
}

/// 模型所属的参数族
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    /// 新一代推理模型，只支持默认温度
    Reasoning,
    /// GPT-4o 及更早的模型
    Classic,
}

impl ModelFamily {
    pub fn of(model: &str) -> Self {
        if model.contains("gpt-5") { Self::Reasoning } else { Self::Classic }
    }
}

/// 与模型族相关的请求参数，两组字段不会同时出现
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_completion_tokens: Option<u32>,
}

impl GenerationParams {
    pub fn for_model(model: &str) -> Self {
        match ModelFamily::of(model) {
            ModelFamily::Reasoning => Self {
                temperature: None,
                max_tokens: None,
                max_completion_tokens: Some(MAX_OUTPUT_TOKENS),
            },
            ModelFamily::Classic => Self {
                temperature: Some(TEMPERATURE),
                max_tokens: Some(MAX_OUTPUT_TOKENS),
                max_completion_tokens: None,
            },
        }
    }
}

/// 构建带图片的 chat 请求
pub fn build_request(model: &str, image_url: String) -> ChatRequest {
    let params = GenerationParams::for_model(model);
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: vec![
                ContentPart::Text { text: PROMPT.to_string() },
                ContentPart::ImageUrl { image_url: ImageUrl { url: image_url } },
            ],
        }],
        temperature: params.temperature,
        max_tokens: params.max_tokens,
        max_completion_tokens: params.max_completion_tokens,
    }
}

/// 生成过程的 token 统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageStats {
    pub output_tokens: u32,
    pub reasoning_tokens: u32,
    pub finish_reason: String,
}

impl fmt::Display for UsageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Output: {} | Reasoning: {} | Finish: {}]",
            STATS_MARKER, self.output_tokens, self.reasoning_tokens, self.finish_reason
        )
    }
}

/// 模型生成的图片描述
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub model: String,
    /// 模型输出的正文；模型没有输出文字时为补充的说明
    pub text: String,
    /// 模型是否输出了正文
    pub empty: bool,
    pub stats: UsageStats,
}

impl Description {
    /// 从接口响应中提取描述
    pub fn from_response(model: &str, response: ChatResponse) -> Result<Self, ModelError> {
        let usage = response.usage.unwrap_or_default();
        let choice = response.choices.into_iter().next().ok_or(ModelError::EmptyResponse)?;
        let stats = UsageStats {
            output_tokens: usage.completion_tokens,
            reasoning_tokens: usage.reasoning_tokens(),
            finish_reason: choice.finish_reason.unwrap_or_else(|| "unknown".to_string()),
        };

        let content = choice.message.content.unwrap_or_default();
        if !content.trim().is_empty() {
            return Ok(Self { model: model.to_string(), text: content, empty: false, stats });
        }

        let text = format!(
            "Model consumed {} tokens but returned no text (finish reason: {}).",
            stats.output_tokens, stats.finish_reason
        );
        Ok(Self { model: model.to_string(), text, empty: true, stats })
    }
}

/// 正文后附带统计信息，与写入向量库的内容一致
impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\n{}", self.text, self.stats)
    }
}

/// 生成失败时写入向量库的诊断文本
pub fn failure_text(model: &str, err: &ModelError) -> String {
    format!("Model error {}: {}", model, err)
}

/// 图片描述生成器
pub trait Describer {
    fn describe(
        &self,
        image: &Path,
        model: &str,
    ) -> impl Future<Output = Result<Description, ModelError>> + Send;
}

impl Describer for OpenAiClient {
    async fn describe(&self, image: &Path, model: &str) -> Result<Description, ModelError> {
        let data = tokio::fs::read(image).await?;
        debug!("读取图片 {}，{} 字节", image.display(), data.len());

        let request = build_request(model, image_data_url(image, &data));
        let response = self.chat(&request).await?;
        let description = Description::from_response(model, response)?;

        info!(
            "{} 生成描述完成: output={} reasoning={} finish={}",
            model,
            description.stats.output_tokens,
            description.stats.reasoning_tokens,
            description.stats.finish_reason
        );
        Ok(description)
    }
}
