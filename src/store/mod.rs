//! 持久化的向量集合
//!
//! 进程内只有一个以固定名称标识的集合，首次访问时按需创建。

mod collection;
mod crud;
mod error;
mod model;

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tokio::sync::{RwLock, RwLockMappedWriteGuard, RwLockReadGuard, RwLockWriteGuard};

pub use self::collection::Collection;
pub use self::error::{Result, StoreError};
pub use self::model::*;

pub struct VectorStore {
    name: String,
    dir: PathBuf,
    config: CollectionConfig,
    inner: RwLock<Option<Collection>>,
}

impl VectorStore {
    /// `root` 为向量数据库目录，集合保存在 `root/name` 下
    pub fn new(root: impl AsRef<Path>, name: &str, config: CollectionConfig) -> Self {
        Self {
            name: name.to_string(),
            dir: root.as_ref().join(name),
            config,
            inner: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// 确保集合已打开，只有在集合确实不存在时才会创建
    pub async fn ensure_collection(&self) -> Result<()> {
        if self.inner.read().await.is_some() {
            return Ok(());
        }

        let mut inner = self.inner.write().await;
        if inner.is_some() {
            return Ok(());
        }

        let collection = match Collection::open(&self.name, &self.dir).await {
            Ok(collection) => collection,
            Err(StoreError::NotFound(_)) => {
                info!("集合 {} 不存在，正在创建", self.name);
                Collection::create(&self.name, &self.dir, self.config).await?
            }
            Err(e) => return Err(e),
        };

        if collection.config() != &self.config {
            let found = *collection.config();
            collection.close().await;
            return Err(StoreError::ConfigMismatch {
                name: self.name.clone(),
                expected: self.config,
                found,
            });
        }

        *inner = Some(collection);
        Ok(())
    }

    /// 获取集合信息，集合不存在时返回 [`StoreError::NotFound`]
    pub async fn get_collection(&self) -> Result<CollectionInfo> {
        if let Some(collection) = self.inner.read().await.as_ref() {
            return collection.info().await;
        }
        Collection::read_config(&self.name, &self.dir).await?;
        self.read().await?.info().await
    }

    /// 创建空集合，已有的集合会被覆盖
    pub async fn create_collection(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(old) = inner.take() {
            old.close().await;
        }
        *inner = Some(Collection::create(&self.name, &self.dir, self.config).await?);
        Ok(())
    }

    /// 删除整个集合
    pub async fn delete_collection(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        let opened = inner.take();
        let existed = opened.is_some();
        if let Some(collection) = opened {
            collection.close().await;
        }

        if !tokio::fs::try_exists(&self.dir).await? {
            return match existed {
                true => Ok(()),
                false => Err(StoreError::NotFound(self.name.clone())),
            };
        }
        tokio::fs::remove_dir_all(&self.dir).await?;
        info!("已删除集合 {}", self.name);
        Ok(())
    }

    /// 删除并重建集合，删除失败不会中断重建
    pub async fn reset(&self) -> Result<CollectionInfo> {
        match self.delete_collection().await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => debug!("集合 {} 不存在，直接创建", self.name),
            Err(e) => warn!("删除集合 {} 失败: {}", self.name, e),
        }
        self.create_collection().await?;
        self.get_collection().await
    }

    pub async fn upsert(&self, point: &Point) -> Result<()> {
        self.write().await?.upsert(point).await
    }

    pub async fn query(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        self.read().await?.query(vector, limit).await
    }

    async fn read(&self) -> Result<RwLockReadGuard<'_, Collection>> {
        self.ensure_collection().await?;
        RwLockReadGuard::try_map(self.inner.read().await, |c| c.as_ref())
            .map_err(|_| StoreError::NotFound(self.name.clone()))
    }

    async fn write(&self) -> Result<RwLockMappedWriteGuard<'_, Collection>> {
        self.ensure_collection().await?;
        RwLockWriteGuard::try_map(self.inner.write().await, |c| c.as_mut())
            .map_err(|_| StoreError::NotFound(self.name.clone()))
    }
}
