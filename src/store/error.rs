use std::fmt::Display;

use super::CollectionConfig;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("集合 {0} 不存在")]
    NotFound(String),
    #[error("集合 {name} 的配置 {found:?} 与期望的 {expected:?} 不一致")]
    ConfigMismatch { name: String, expected: CollectionConfig, found: CollectionConfig },
    #[error("向量维度错误: 期望 {expected}，实际 {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("索引错误: {0}")]
    Index(String),
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("数据库迁移失败: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("集合元数据损坏: {0}")]
    Meta(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// usearch 的错误类型来自 cxx，这里统一转为字符串
pub(super) fn index_err(e: impl Display) -> StoreError {
    StoreError::Index(e.to_string())
}
