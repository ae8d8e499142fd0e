use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 向量距离度量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    Cosine,
}

/// 集合配置，创建后不可修改
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CollectionConfig {
    /// 向量维度
    pub size: usize,
    pub distance: Distance,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CollectionInfo {
    pub name: String,
    pub config: CollectionConfig,
    pub points_count: u64,
}

/// 随向量保存的图片信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Payload {
    /// 原图保存路径
    pub path: String,
    /// 模型生成的描述，包含统计信息后缀
    pub description: String,
    /// 生成描述的模型
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Point {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

/// 搜索命中的点
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoredPoint {
    pub id: String,
    /// 余弦相似度，越大越相似
    pub score: f32,
    pub payload: Payload,
}

/// 点记录，不含向量
#[derive(Debug, sqlx::FromRow)]
pub struct PointRecord {
    pub key: i64,
    pub id: String,
    pub path: String,
    pub description: String,
    pub model: String,
}

impl PointRecord {
    pub fn into_scored(self, score: f32) -> ScoredPoint {
        ScoredPoint {
            id: self.id,
            score,
            payload: Payload { path: self.path, description: self.description, model: self.model },
        }
    }
}
