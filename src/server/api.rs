use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum_typed_multipart::TypedMultipart;
use log::info;

use super::error::{AppError, Result};
use super::state::{AppState, CurrentUser};
use super::types::*;
use crate::describe::{SUPPORTED_MODELS, is_supported_model};
use crate::metrics;
use crate::store::CollectionInfo;
use crate::utils::sanitize_file_name;

/// 登录，任意非空用户名均可
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, body = LoginResponse),
        (status = 400, description = "用户名为空"),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let token = state
        .sessions
        .login(&data.username)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(LoginResponse { token, username: data.username }))
}

/// 注销当前会话
#[utoipa::path(post, path = "/logout", responses((status = 204)))]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> StatusCode {
    state.sessions.logout(&user.token).await;
    StatusCode::NO_CONTENT
}

/// 当前登录的用户
#[utoipa::path(get, path = "/me", responses((status = 200, body = UserResponse)))]
pub async fn me_handler(user: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse { username: user.session.username })
}

/// 可用于生成描述的模型
#[utoipa::path(get, path = "/models", responses((status = 200, body = Vec<String>)))]
pub async fn models_handler() -> Json<Vec<&'static str>> {
    Json(SUPPORTED_MODELS.to_vec())
}

/// 上传图片，生成描述并写入向量库
#[utoipa::path(
    post,
    path = "/index",
    request_body(content = IndexForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = IndexResponse),
    )
)]
pub async fn index_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    data: TypedMultipart<IndexRequest>,
) -> Result<Json<IndexResponse>> {
    if !is_supported_model(&data.model) {
        return Err(AppError::BadRequest(format!("不支持的模型: {}", data.model)));
    }
    if data.file.is_empty() {
        return Err(AppError::BadRequest("没有上传文件".to_string()));
    }

    let mut files = Vec::with_capacity(data.file.len());
    for file in &data.file {
        let file_name = match &file.metadata.file_name {
            Some(file_name) if sanitize_file_name(file_name).is_some() => file_name.as_str(),
            _ => return Err(AppError::BadRequest("文件名不能为空".to_string())),
        };
        files.push((file_name, file.contents.as_ref()));
    }

    let _guard = state.action.lock().await;
    info!("{} 使用 {} 索引 {} 张图片", user.session.username, data.model, files.len());

    let start = Instant::now();
    let result = state.pipeline.index_batch(files, &data.model).await?;

    Ok(Json(IndexResponse { time: start.elapsed().as_millis() as u64, result }))
}

/// 按文本描述搜索图片
#[utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    responses(
        (status = 200, body = SearchResponse),
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let limit = query.limit.unwrap_or(state.limit);

    let _guard = state.action.lock().await;
    let start = Instant::now();
    let result = state.pipeline.search(&query.q, limit).await?;

    Ok(Json(SearchResponse { time: start.elapsed().as_millis() as u64, result }))
}

/// 删除全部图片记录并重建向量集合
#[utoipa::path(post, path = "/reset", responses((status = 200, body = CollectionInfo)))]
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<CollectionInfo>> {
    let _guard = state.action.lock().await;
    info!("{} 重置了向量库", user.session.username);
    Ok(Json(state.pipeline.reset().await?))
}

/// 导出 prometheus 指标
pub async fn metrics_handler() -> Result<String> {
    Ok(metrics::gather_text()?)
}
