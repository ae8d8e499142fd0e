use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_auth::AuthBearer;
use tokio::sync::Mutex;

use super::error::AppError;
use crate::openai::OpenAiClient;
use crate::pipeline::Pipeline;
use crate::session::{Session, SessionState, SessionStore};

/// 应用状态
pub struct AppState {
    /// 索引与搜索流程
    pub pipeline: Pipeline<OpenAiClient>,
    /// 登录会话
    pub sessions: SessionStore,
    /// 默认返回的搜索结果数量
    pub limit: usize,
    /// 同一时间只执行一个索引、搜索或重置操作
    pub action: Mutex<()>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(pipeline: Pipeline<OpenAiClient>, limit: usize) -> Arc<Self> {
        Arc::new(AppState { pipeline, sessions: SessionStore::new(), limit, action: Mutex::new(()) })
    }
}

/// 已登录的用户
pub struct CurrentUser {
    pub token: String,
    pub session: Session,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthBearer(token) = AuthBearer::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized)?;
        match state.sessions.state(&token).await {
            SessionState::LoggedIn(session) => Ok(CurrentUser { token, session }),
            SessionState::LoggedOut => Err(AppError::Unauthorized),
        }
    }
}
