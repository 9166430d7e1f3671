//! 后端 RPC trait 定义

use async_trait::async_trait;
use kulu_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 后端 RPC 调用
#[async_trait]
pub trait BackendRpc: Send + Sync {
    /// 调用命名的服务端过程，参数为 JSON 对象
    async fn call(&self, function: &str, params: Value) -> AppResult<Value>;
}

/// 认证类 RPC 的统一返回结构
///
/// `{ success: bool, user?: {...}, error?: string }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RpcResponse {
    /// 解析 RPC 返回值
    pub fn from_value(value: Value) -> AppResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| AppError::external_service(format!("Malformed RPC response: {}", e)))
    }

    /// `success: false` 转为错误
    pub fn into_result(self, function: &str) -> AppResult<Option<Value>> {
        if self.success {
            Ok(self.user)
        } else {
            let message = self
                .error
                .unwrap_or_else(|| format!("{} failed", function));
            Err(AppError::validation(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_response_carries_backend_message() {
        let resp = RpcResponse::from_value(json!({"success": false, "error": "Hatalı şifre"}))
            .unwrap();
        let err = resp.into_result("login_user").unwrap_err();
        assert!(err.to_string().contains("Hatalı şifre"));
    }

    #[test]
    fn test_failed_response_without_message() {
        let resp = RpcResponse::from_value(json!({"success": false})).unwrap();
        let err = resp.into_result("approve_user").unwrap_err();
        assert!(err.to_string().contains("approve_user failed"));
    }

    #[test]
    fn test_success_without_user() {
        let resp = RpcResponse::from_value(json!({"success": true})).unwrap();
        assert!(resp.into_result("delete_listing").unwrap().is_none());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(RpcResponse::from_value(json!("ok")).is_err());
    }
}
