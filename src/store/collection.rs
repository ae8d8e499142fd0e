use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use tokio::fs;
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use super::error::{Result, StoreError, index_err};
use super::*;

const META_FILE: &str = "collection.json";
const DB_FILE: &str = "points.db";
const INDEX_FILE: &str = "vectors.usearch";

/// 磁盘上的单个向量集合
///
/// 向量保存在 usearch 索引中，点的 ID 与 payload 保存在 SQLite 中，
/// 两者通过自增的整数键关联。
pub struct Collection {
    name: String,
    dir: PathBuf,
    config: CollectionConfig,
    index: Index,
    db: SqlitePool,
}

impl Collection {
    /// 创建一个空集合，目录中已有的数据会被清除
    pub async fn create(name: &str, dir: &Path, config: CollectionConfig) -> Result<Self> {
        if fs::try_exists(dir).await? {
            fs::remove_dir_all(dir).await?;
        }
        fs::create_dir_all(dir).await?;

        let db = open_db(&dir.join(DB_FILE)).await?;
        let index = new_index(&config)?;
        let collection =
            Self { name: name.to_string(), dir: dir.to_path_buf(), config, index, db };
        collection.save_index()?;

        // 元数据最后写入，作为集合创建完成的标志
        fs::write(dir.join(META_FILE), serde_json::to_vec_pretty(&config)?).await?;
        info!("已创建集合 {}: {:?}", name, config);
        Ok(collection)
    }

    /// 打开已有集合，不存在时返回 [`StoreError::NotFound`]
    pub async fn open(name: &str, dir: &Path) -> Result<Self> {
        let config = Self::read_config(name, dir).await?;
        let db = open_db(&dir.join(DB_FILE)).await?;
        let index = new_index(&config)?;
        let mut collection =
            Self { name: name.to_string(), dir: dir.to_path_buf(), config, index, db };
        collection.load_index().await?;
        info!("已打开集合 {}，共 {} 个点", name, collection.index.size());
        Ok(collection)
    }

    /// 读取集合配置
    pub async fn read_config(name: &str, dir: &Path) -> Result<CollectionConfig> {
        let data = match fs::read(dir.join(META_FILE)).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub async fn info(&self) -> Result<CollectionInfo> {
        let points_count = crud::count_points(&self.db).await?;
        Ok(CollectionInfo {
            name: self.name.clone(),
            config: self.config,
            points_count: points_count as u64,
        })
    }

    /// 插入或替换一个点
    ///
    /// 新向量在事务提交前写入索引，写入失败时数据库随事务回滚。
    pub async fn upsert(&self, point: &Point) -> Result<()> {
        self.check_dimension(&point.vector)?;

        let mut tx = self.db.begin().await?;
        let old_key = crud::find_key(&mut *tx, &point.id).await?;
        if let Some(key) = old_key {
            crud::delete_point(&mut *tx, key).await?;
        }
        let key = crud::insert_point(&mut *tx, point).await?;

        self.reserve_one()?;
        self.index.add(key as u64, &point.vector).map_err(index_err)?;
        if let Err(e) = tx.commit().await {
            if let Err(e) = self.index.remove(key as u64) {
                warn!("撤销索引键 {} 失败: {}", key, e);
            }
            return Err(e.into());
        }

        if let Some(key) = old_key {
            debug!("替换点 {}，旧键 {}", point.id, key);
            self.index.remove(key as u64).map_err(index_err)?;
        }
        self.save_index()
    }

    /// 返回最相似的 `limit` 个点，相似度从高到低
    pub async fn query(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        self.check_dimension(vector)?;
        let limit = limit.min(self.index.size());
        if limit == 0 {
            return Ok(vec![]);
        }

        let matches = self.index.search(vector, limit).map_err(index_err)?;
        let mut points = Vec::with_capacity(matches.keys.len());
        for (key, distance) in matches.keys.into_iter().zip(matches.distances) {
            match crud::get_point(&self.db, key as i64).await? {
                Some(record) => points.push(record.into_scored(1. - distance)),
                None => warn!("索引键 {} 在数据库中不存在", key),
            }
        }
        Ok(points)
    }

    /// 关闭数据库连接
    pub async fn close(self) {
        self.db.close().await;
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.config.size {
            return Err(StoreError::DimensionMismatch {
                expected: self.config.size,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    fn reserve_one(&self) -> Result<()> {
        let size = self.index.size();
        if size + 1 > self.index.capacity() {
            self.index.reserve((size * 2).max(64)).map_err(index_err)?;
        }
        Ok(())
    }

    fn index_path(&self) -> Result<String> {
        let path = self.dir.join(INDEX_FILE);
        path.to_str()
            .map(str::to_string)
            .ok_or_else(|| StoreError::Index(format!("无效的索引路径: {}", path.display())))
    }

    fn save_index(&self) -> Result<()> {
        self.index.save(&self.index_path()?).map_err(index_err)
    }

    /// 加载索引文件，与数据库不一致时从数据库重建
    async fn load_index(&mut self) -> Result<()> {
        let count = crud::count_points(&self.db).await? as usize;
        let path = self.index_path()?;

        if fs::try_exists(&path).await? {
            self.index.load(&path).map_err(index_err)?;
            if self.index.size() == count {
                return Ok(());
            }
            warn!("索引中有 {} 个向量，数据库中有 {} 个点，重建索引", self.index.size(), count);
            self.index = new_index(&self.config)?;
        } else if count > 0 {
            warn!("索引文件不存在，从数据库重建 {} 个向量", count);
        }

        self.index.reserve(count.max(64)).map_err(index_err)?;
        for (key, blob) in crud::all_vectors(&self.db).await? {
            let vector = blob_to_vector(&blob, self.config.size)?;
            self.index.add(key as u64, &vector).map_err(index_err)?;
        }
        self.save_index()
    }
}

async fn open_db(filename: &Path) -> Result<SqlitePool> {
    debug!("连接数据库: {}", filename.display());

    let options = SqliteConnectOptions::new()
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .filename(filename)
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;
    sqlx::migrate!().run(&pool).await?;
    Ok(pool)
}

fn new_index(config: &CollectionConfig) -> Result<Index> {
    let metric = match config.distance {
        Distance::Cosine => MetricKind::Cos,
    };
    let options = IndexOptions {
        dimensions: config.size,
        metric,
        quantization: ScalarKind::F32,
        ..Default::default()
    };
    Index::new(&options).map_err(index_err)
}

fn blob_to_vector(blob: &[u8], size: usize) -> Result<Vec<f32>> {
    if blob.len() != size * 4 {
        return Err(StoreError::DimensionMismatch { expected: size, actual: blob.len() / 4 });
    }
    let mut vector = vec![0f32; size];
    bytemuck::cast_slice_mut::<f32, u8>(&mut vector).copy_from_slice(blob);
    Ok(vector)
}
