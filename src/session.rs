//! 登录会话
//!
//! 每个会话由一个随机 token 标识，不做持久化，进程重启后全部失效。

use std::collections::HashMap;

use log::info;
use rand::distr::{Alphanumeric, SampleString};
use tokio::sync::RwLock;

const TOKEN_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("用户名不能为空")]
    EmptyUsername,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn(Session),
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登录并返回会话 token，任意非空用户名均可登录
    pub async fn login(&self, username: &str) -> Result<String, SessionError> {
        if username.is_empty() {
            return Err(SessionError::EmptyUsername);
        }
        let token = Alphanumeric.sample_string(&mut rand::rng(), TOKEN_LEN);
        let session = Session { username: username.to_string() };
        self.sessions.write().await.insert(token.clone(), session);
        info!("用户 {} 已登录", username);
        Ok(token)
    }

    /// 注销会话，返回会话此前是否存在
    pub async fn logout(&self, token: &str) -> bool {
        match self.sessions.write().await.remove(token) {
            Some(session) => {
                info!("用户 {} 已注销", session.username);
                true
            }
            None => false,
        }
    }

    pub async fn state(&self, token: &str) -> SessionState {
        match self.sessions.read().await.get(token) {
            Some(session) => SessionState::LoggedIn(session.clone()),
            None => SessionState::LoggedOut,
        }
    }
}
