//! SQLite 持久存储层实现

use async_trait::async_trait;
use kulu_errors::{AppError, AppResult};
use kulu_ports::StorageTier;
use sqlx::SqlitePool;

use crate::connection::{SqliteConfig, check_connection, create_pool};

const CREATE_STORE_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS kv_store (
        key  TEXT PRIMARY KEY NOT NULL,
        data TEXT NOT NULL
    )
";

const SELECT_SQL: &str = "SELECT data FROM kv_store WHERE key = ?";

const UPSERT_SQL: &str = r"
    INSERT INTO kv_store (key, data) VALUES (?, ?)
    ON CONFLICT(key) DO UPDATE SET data = excluded.data
";

const DELETE_SQL: &str = "DELETE FROM kv_store WHERE key = ?";

/// SQLite 持久存储层
///
/// 单个对象存储表，每行 `{ key, data }`
#[derive(Clone)]
pub struct SqliteTier {
    pool: SqlitePool,
}

impl SqliteTier {
    /// 基于已有连接池创建，并确保表结构存在
    pub async fn new(pool: SqlitePool) -> AppResult<Self> {
        sqlx::query(CREATE_STORE_SQL)
            .execute(&pool)
            .await
            .map_err(|e| AppError::internal(format!("SQLite schema setup failed: {}", e)))?;
        Ok(Self { pool })
    }

    /// 打开（必要时创建）数据库
    pub async fn open(config: &SqliteConfig) -> AppResult<Self> {
        let pool = create_pool(config).await?;
        let tier = Self::new(pool).await?;
        tracing::debug!(url = %config.url, "SQLite durable store opened");
        Ok(tier)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl StorageTier for SqliteTier {
    fn name(&self) -> &'static str {
        "durable"
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(SELECT_SQL)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::internal(format!("SQLite get failed: {}", e)))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::internal(format!("SQLite transaction failed: {}", e)))?;

        sqlx::query(UPSERT_SQL)
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::internal(format!("SQLite set failed: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::internal(format!("SQLite commit failed: {}", e)))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        sqlx::query(DELETE_SQL)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::internal(format!("SQLite delete failed: {}", e)))?;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        check_connection(&self.pool).await
    }
}
