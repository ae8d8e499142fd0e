use sqlx::{Executor, Result, Sqlite, SqlitePool};

use super::{Point, PointRecord};

/// 根据点 ID 查找索引键
pub async fn find_key<'c, E>(executor: E, id: &str) -> Result<Option<i64>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let row: Option<(i64,)> = sqlx::query_as("SELECT key FROM point WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(|(key,)| key))
}

pub async fn delete_point<'c, E>(executor: E, key: i64) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query("DELETE FROM point WHERE key = ?").bind(key).execute(executor).await?;
    Ok(())
}

/// 插入点记录，返回新分配的索引键
pub async fn insert_point<'c, E>(executor: E, point: &Point) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let vector: &[u8] = bytemuck::cast_slice(&point.vector);
    let (key,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO point (id, vector, path, description, model)
        VALUES (?, ?, ?, ?, ?)
        RETURNING key
        "#,
    )
    .bind(&point.id)
    .bind(vector)
    .bind(&point.payload.path)
    .bind(&point.payload.description)
    .bind(&point.payload.model)
    .fetch_one(executor)
    .await?;
    Ok(key)
}

pub async fn get_point(executor: &SqlitePool, key: i64) -> Result<Option<PointRecord>> {
    sqlx::query_as("SELECT key, id, path, description, model FROM point WHERE key = ?")
        .bind(key)
        .fetch_optional(executor)
        .await
}

pub async fn count_points(executor: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM point").fetch_one(executor).await?;
    Ok(count)
}

/// 读取全部向量，用于重建索引
pub async fn all_vectors(executor: &SqlitePool) -> Result<Vec<(i64, Vec<u8>)>> {
    sqlx::query_as("SELECT key, vector FROM point ORDER BY key").fetch_all(executor).await
}
