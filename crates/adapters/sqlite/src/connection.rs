//! SQLite 连接管理

use std::str::FromStr;
use std::time::Duration;

use kulu_errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// SQLite 连接池配置
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 4,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl SqliteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// 创建 SQLite 连接池
///
/// 内存数据库每个连接都是独立实例，因此固定为单连接且不回收
pub async fn create_pool(config: &SqliteConfig) -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| AppError::internal(format!("Invalid SQLite url: {}", e)))?
        .create_if_missing(true);

    let pool_options = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };

    pool_options
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
        .map_err(|e| AppError::internal(format!("Failed to open SQLite store: {}", e)))
}

/// 检查数据库连接
pub async fn check_connection(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| AppError::internal(format!("SQLite health check failed: {}", e)))?;
    Ok(())
}
