//! 后端客户端配置

use std::time::Duration;

use kulu_common::RetryConfig;
use secrecy::Secret;

/// 后端客户端配置
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// 项目地址，例如 `https://xyz.supabase.co`
    pub base_url: String,
    /// 匿名访问密钥
    pub anon_key: Secret<String>,
    /// 单次请求超时
    pub timeout: Duration,
    /// 暂时性错误的重试策略
    pub retry: RetryConfig,
    /// 可安全重发的过程；其余过程只在请求未送达时重试
    pub idempotent_functions: Vec<String>,
}

/// 默认可重发的过程
pub const DEFAULT_IDEMPOTENT_FUNCTIONS: &[&str] = &["login_user"];

impl HttpBackendConfig {
    pub fn new(base_url: impl Into<String>, anon_key: Secret<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key,
            timeout: Duration::from_secs(15),
            retry: RetryConfig::default(),
            idempotent_functions: DEFAULT_IDEMPOTENT_FUNCTIONS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_idempotent_functions<I, S>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.idempotent_functions = functions.into_iter().map(Into::into).collect();
        self
    }
}
