//! 图片索引与文本搜索流程

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Result, anyhow};
use log::{info, warn};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::describe::{Describer, failure_text};
use crate::embed::Embedder;
use crate::metrics;
use crate::store::{CollectionInfo, Payload, Point, ScoredPoint, VectorStore};
use crate::utils::sanitize_file_name;

/// 描述生成失败时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// 跳过该图片
    #[default]
    Skip,
    /// 把错误信息当作描述写入向量库
    Index,
}

/// 单张图片的索引结果
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexOutcome {
    Indexed { id: String, description: String },
    Skipped { error: String },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IndexReport {
    pub file_name: String,
    pub path: String,
    #[serde(flatten)]
    pub outcome: IndexOutcome,
}

pub struct Pipeline<C> {
    client: C,
    store: VectorStore,
    upload_dir: PathBuf,
    policy: FailurePolicy,
}

impl<C> Pipeline<C>
where
    C: Describer + Embedder + Sync,
{
    pub fn new(client: C, store: VectorStore, upload_dir: impl Into<PathBuf>) -> Self {
        Self { client, store, upload_dir: upload_dir.into(), policy: FailurePolicy::default() }
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// 按原文件名保存上传的图片，同名文件会被覆盖
    pub async fn save_upload(&self, file_name: &str, data: &[u8]) -> Result<PathBuf> {
        let name = sanitize_file_name(file_name)
            .ok_or_else(|| anyhow!("无效的文件名: {:?}", file_name))?;
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let path = self.upload_dir.join(name);
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }

    /// 为一张已保存的图片生成描述并写入向量库
    pub async fn index_image(&self, path: &Path, model: &str) -> Result<IndexOutcome> {
        let (description, status) = match self.client.describe(path, model).await {
            Ok(description) => {
                metrics::inc_generation_tokens(
                    model,
                    description.stats.output_tokens,
                    description.stats.reasoning_tokens,
                );
                (description.to_string(), "indexed")
            }
            Err(e) => {
                warn!("{} 生成描述失败: {}", path.display(), e);
                match self.policy {
                    FailurePolicy::Skip => {
                        metrics::inc_indexed_image(model, "failed");
                        return Ok(IndexOutcome::Skipped { error: e.to_string() });
                    }
                    FailurePolicy::Index => (failure_text(model, &e), "failed_indexed"),
                }
            }
        };

        let vector = self.client.embed(&description).await?;
        let id = Uuid::new_v4().to_string();
        let point = Point {
            id: id.clone(),
            vector,
            payload: Payload {
                path: path.to_string_lossy().into_owned(),
                description: description.clone(),
                model: model.to_string(),
            },
        };
        self.store.upsert(&point).await?;

        metrics::inc_indexed_image(model, status);
        info!("已索引 {} ({})", path.display(), id);
        Ok(IndexOutcome::Indexed { id, description })
    }

    /// 保存并索引一张上传的图片
    pub async fn index_upload(&self, file_name: &str, data: &[u8], model: &str) -> Result<IndexReport> {
        let path = self.save_upload(file_name, data).await?;
        let outcome = self.index_image(&path, model).await?;
        Ok(IndexReport {
            file_name: file_name.to_string(),
            path: path.to_string_lossy().into_owned(),
            outcome,
        })
    }

    /// 依次索引一批上传的图片，任何非生成阶段的错误都会中断剩余的图片
    pub async fn index_batch<'a, I>(&self, files: I, model: &str) -> Result<Vec<IndexReport>>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let mut reports = vec![];
        for (file_name, data) in files {
            reports.push(self.index_upload(file_name, data, model).await?);
        }
        Ok(reports)
    }

    /// 按文本搜索图片，空查询直接返回空结果
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredPoint>> {
        if query.trim().is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();
        let vector = self.client.embed(query).await?;
        let hits = self.store.query(&vector, limit).await?;
        let elapsed = start.elapsed().as_secs_f32();

        metrics::observe_search(elapsed, hits.len());
        info!("搜索完成: 查询 {} 字符，{} 个结果，耗时 {:.2}s", query.chars().count(), hits.len(), elapsed);
        Ok(hits)
    }

    /// 清空向量库
    pub async fn reset(&self) -> Result<CollectionInfo> {
        Ok(self.store.reset().await?)
    }
}
