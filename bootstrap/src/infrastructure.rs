//! 基础设施资源管理
//!
//! 按配置组装存储层、持久化缓存、后端客户端和通知实现

use std::sync::Arc;
use std::time::Duration;

use kulu_adapter_backend::{HttpBackend, HttpBackendConfig};
use kulu_adapter_local::LocalFileTier;
use kulu_adapter_session::SessionTier;
use kulu_adapter_sqlite::{SqliteConfig, SqliteTier};
use kulu_common::{RetryConfig, with_retry};
use kulu_config::{AppConfig, BackendConfig, CacheConfig};
use kulu_errors::{AppError, AppResult};
use kulu_persistent_cache::{CacheOptions, PersistentCache};
use kulu_ports::{BackendRpc, LoggingNotifier, Notifier, StorageTier};
use tracing::{info, warn};

/// 基础设施资源容器
pub struct Infrastructure {
    config: AppConfig,
    cache: Arc<PersistentCache>,
    backend: Arc<dyn BackendRpc>,
    notifier: Arc<dyn Notifier>,
    /// 持久层打开失败的原因
    durable_error: Option<String>,
}

impl Infrastructure {
    /// 从配置创建基础设施资源
    ///
    /// 持久层打不开时降级为只用快速层和会话层
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let (cache, durable_error) = build_cache(&config.cache).await?;
        let backend = build_backend(&config.backend)?;

        Ok(Self {
            config,
            cache: Arc::new(cache),
            backend: Arc::new(backend),
            notifier: Arc::new(LoggingNotifier),
            durable_error,
        })
    }

    /// 替换通知实现
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> Arc<PersistentCache> {
        self.cache.clone()
    }

    pub fn backend(&self) -> Arc<dyn BackendRpc> {
        self.backend.clone()
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.notifier.clone()
    }

    pub fn durable_error(&self) -> Option<&str> {
        self.durable_error.as_deref()
    }
}

/// 按 快速层 → 会话层 → 持久层 的顺序组装缓存
pub async fn build_cache(config: &CacheConfig) -> AppResult<(PersistentCache, Option<String>)> {
    let expiry_window = chrono::Duration::try_days(config.expiry_days).ok_or_else(|| {
        AppError::validation(format!(
            "cache.expiry_days out of range: {}",
            config.expiry_days
        ))
    })?;

    std::fs::create_dir_all(&config.data_dir).map_err(|e| {
        AppError::internal(format!(
            "Failed to create data dir {}: {}",
            config.data_dir.display(),
            e
        ))
    })?;

    let mut tiers: Vec<Arc<dyn StorageTier>> = vec![
        Arc::new(LocalFileTier::new(config.data_dir.clone())) as Arc<dyn StorageTier>,
        Arc::new(SessionTier::new(config.session_capacity)) as Arc<dyn StorageTier>,
    ];

    let sqlite_config = SqliteConfig::new(config.durable_url());
    let retry = RetryConfig::new(2, Duration::from_millis(100), Duration::from_millis(500));
    let durable_error = match with_retry(&retry, "SQLite durable tier", || {
        SqliteTier::open(&sqlite_config)
    })
    .await
    {
        Ok(tier) => {
            info!(url = %sqlite_config.url, "Durable tier opened");
            tiers.push(Arc::new(tier));
            None
        }
        Err(e) => {
            warn!(
                url = %sqlite_config.url,
                error = %e,
                "Failed to open durable tier, continuing without it"
            );
            Some(e.to_string())
        }
    };

    let options = CacheOptions::default()
        .with_expiry_window(Some(expiry_window))
        .with_tier_timeout(config.tier_timeout());

    info!(
        tiers = tiers.len(),
        data_dir = %config.data_dir.display(),
        "Persistent cache assembled"
    );
    Ok((PersistentCache::new(tiers, options), durable_error))
}

/// 创建后端 HTTP 客户端
pub fn build_backend(config: &BackendConfig) -> AppResult<HttpBackend> {
    let retry = RetryConfig::new(
        config.max_retries + 1,
        Duration::from_millis(200),
        Duration::from_secs(3),
    );
    let http_config = HttpBackendConfig::new(config.url.clone(), config.anon_key.clone())
        .with_timeout(config.timeout())
        .with_retry(retry);
    HttpBackend::new(http_config)
}
