//! kulu-config - 配置加载库

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 后端（BaaS）配置
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: Secret<String>,
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_backend_timeout_secs() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    3
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 持久化用户缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 本地文件存储目录
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// SQLite 连接串，缺省时放在 data_dir 下
    pub durable_url: Option<String>,
    #[serde(default = "default_session_capacity")]
    pub session_capacity: u64,
    /// 单个存储层操作的超时（毫秒）
    #[serde(default = "default_tier_timeout_ms")]
    pub tier_timeout_ms: u64,
    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".kulu")
}

fn default_session_capacity() -> u64 {
    64
}

fn default_tier_timeout_ms() -> u64 {
    3000
}

/// 有效期上限（天）
pub const MAX_EXPIRY_DAYS: i64 = 36_500;

fn default_expiry_days() -> i64 {
    30
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            durable_url: None,
            session_capacity: default_session_capacity(),
            tier_timeout_ms: default_tier_timeout_ms(),
            expiry_days: default_expiry_days(),
        }
    }
}

impl CacheConfig {
    pub fn tier_timeout(&self) -> Duration {
        Duration::from_millis(self.tier_timeout_ms)
    }

    /// SQLite 连接串
    pub fn durable_url(&self) -> String {
        match &self.durable_url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}", self.data_dir.join("kulu.db").display()),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    pub backend: BackendConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 依次合并 `default.toml`、`<APP_ENV>.toml` 和 `KULU_` 前缀的环境变量
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());
        Self::from_figment(Self::figment(config_dir, &env))
    }

    /// 构建 figment，便于测试替换来源
    pub fn figment(config_dir: &str, env: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("KULU_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.backend.url)
            .map_err(|e| ConfigError::Invalid(format!("backend.url: {}", e)))?;
        if self.cache.expiry_days <= 0 || self.cache.expiry_days > MAX_EXPIRY_DAYS {
            return Err(ConfigError::Invalid(format!(
                "cache.expiry_days must be between 1 and {}",
                MAX_EXPIRY_DAYS
            )));
        }
        if self.cache.tier_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "cache.tier_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
