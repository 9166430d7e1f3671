//! kulu-errors - 统一错误处理
//!
//! 所有 crate 共享同一个错误枚举，适配器在边界处把底层错误转换为 `AppError`

use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 所有存储层都无法写入
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn storage_unavailable(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
            Self::Serialization(_) => 500,
            Self::ExternalService(_) => 502,
            Self::StorageUnavailable(_) => 503,
            Self::Timeout(_) => 504,
        }
    }

    /// 根据后端返回的 HTTP 状态码构造错误
    pub fn from_http_status(status: u16, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match status {
            400 | 422 => Self::Validation(msg),
            401 => Self::Unauthorized(msg),
            403 => Self::Forbidden(msg),
            404 => Self::NotFound(msg),
            409 => Self::Conflict(msg),
            408 | 504 => Self::Timeout(msg),
            _ => Self::ExternalService(msg),
        }
    }

    /// 是否为暂时性错误（可重试）
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ExternalService(_) | Self::Timeout(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_round_trip() {
        for status in [400u16, 401, 403, 404, 409, 504] {
            let err = AppError::from_http_status(status, "x");
            assert_eq!(err.status_code(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_external() {
        let err = AppError::from_http_status(500, "boom");
        assert!(matches!(err, AppError::ExternalService(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_serde_error_conversion() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
