use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::pipeline::IndexReport;
use crate::store::ScoredPoint;

/// 登录请求
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// 用户名，不能为空
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// 之后的请求需要以 `Authorization: Bearer <token>` 携带
    pub token: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub username: String,
}

/// 索引请求参数
#[derive(TryFromMultipart)]
pub struct IndexRequest {
    pub model: String,
    #[form_data(limit = "unlimited")]
    pub file: Vec<FieldData<Bytes>>,
}

/// 索引表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct IndexForm {
    /// 生成描述使用的模型
    pub model: String,
    /// 上传的图片文件，可以是多张图片
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// 索引响应
#[derive(Debug, Serialize, ToSchema)]
pub struct IndexResponse {
    /// 处理耗时，单位为毫秒
    pub time: u64,
    /// 每张图片的处理结果
    pub result: Vec<IndexReport>,
}

/// 搜索参数
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// 搜索文本
    #[serde(default)]
    pub q: String,
    /// 返回结果数量
    pub limit: Option<usize>,
}

/// 搜索响应
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// 搜索耗时，单位为毫秒
    pub time: u64,
    /// 按相似度从高到低排列的结果
    pub result: Vec<ScoredPoint>,
}
