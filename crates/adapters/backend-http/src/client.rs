//! 后端 RPC HTTP 客户端

use std::fmt;

use async_trait::async_trait;
use kulu_common::{RetryConfig, with_conditional_retry};
use kulu_errors::{AppError, AppResult};
use kulu_ports::BackendRpc;
use metrics::counter;
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use url::Url;

use crate::config::HttpBackendConfig;

const RPC_PATH: &str = "rest/v1/rpc/";

/// 单次请求失败
///
/// `delivered` 为 false 表示连接没有建立，服务端不可能执行过该过程
#[derive(Debug)]
struct AttemptFailure {
    error: AppError,
    delivered: bool,
}

impl AttemptFailure {
    fn delivered(error: AppError) -> Self {
        Self {
            error,
            delivered: true,
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

/// 是否允许重发
///
/// 可重发的过程遇到暂时性错误就重试；会改变服务端状态的过程
/// 只在请求未送达时重试，超时和 5xx 时服务端可能已经提交
fn should_retry(idempotent: bool, failure: &AttemptFailure) -> bool {
    if idempotent {
        failure.error.is_transient()
    } else {
        !failure.delivered
    }
}

/// HTTP 后端客户端
pub struct HttpBackend {
    client: reqwest::Client,
    rpc_base: Url,
    anon_key: Secret<String>,
    retry: RetryConfig,
    idempotent_functions: Vec<String>,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> AppResult<Self> {
        let mut base = Url::parse(&config.base_url)
            .map_err(|e| AppError::validation(format!("Invalid backend url: {}", e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let rpc_base = base
            .join(RPC_PATH)
            .map_err(|e| AppError::validation(format!("Invalid backend url: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rpc_base,
            anon_key: config.anon_key,
            retry: config.retry,
            idempotent_functions: config.idempotent_functions,
        })
    }

    /// RPC 过程的完整地址
    pub fn rpc_url(&self, function: &str) -> AppResult<Url> {
        let valid = !function.is_empty()
            && function
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(AppError::validation(format!(
                "Invalid RPC function name: {:?}",
                function
            )));
        }
        self.rpc_base
            .join(function)
            .map_err(|e| AppError::internal(format!("Failed to build RPC url: {}", e)))
    }

    fn is_idempotent(&self, function: &str) -> bool {
        self.idempotent_functions.iter().any(|f| f == function)
    }

    async fn call_once(
        &self,
        function: &str,
        url: &Url,
        params: &Value,
    ) -> Result<Value, AttemptFailure> {
        let key = self.anon_key.expose_secret();
        let response = self
            .client
            .post(url.clone())
            .header("apikey", key.as_str())
            .bearer_auth(key)
            .json(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    AttemptFailure {
                        error: AppError::external_service(format!(
                            "RPC {} connection failed: {}",
                            function, e
                        )),
                        delivered: false,
                    }
                } else if e.is_timeout() {
                    AttemptFailure::delivered(AppError::timeout(format!(
                        "RPC {} timed out",
                        function
                    )))
                } else {
                    AttemptFailure::delivered(AppError::external_service(format!(
                        "RPC {} request failed: {}",
                        function, e
                    )))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptFailure::delivered(AppError::from_http_status(
                status.as_u16(),
                format!("RPC {} returned {}: {}", function, status, body),
            )));
        }

        let body = response.text().await.map_err(|e| {
            AttemptFailure::delivered(AppError::external_service(format!(
                "RPC {} body read failed: {}",
                function, e
            )))
        })?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            AttemptFailure::delivered(AppError::external_service(format!(
                "RPC {} returned invalid JSON: {}",
                function, e
            )))
        })
    }
}

#[async_trait]
impl BackendRpc for HttpBackend {
    async fn call(&self, function: &str, params: Value) -> AppResult<Value> {
        let url = self.rpc_url(function)?;
        let idempotent = self.is_idempotent(function);

        let result = with_conditional_retry(
            &self.retry,
            function,
            || self.call_once(function, &url, &params),
            |failure| should_retry(idempotent, failure),
        )
        .await
        .map_err(|failure| failure.error);

        let success = if result.is_ok() { "true" } else { "false" };
        counter!(
            "kulu_rpc_calls_total",
            "function" => function.to_string(),
            "success" => success
        )
        .increment(1);
        tracing::debug!(function, success, idempotent, "Backend RPC finished");

        result
    }
}
