//! 门面操作的输入和输出

use kulu_errors::{AppError, AppResult};
use serde::Serialize;

use crate::domain::CurrentUser;

/// 注册表单
#[derive(Debug, Clone, Serialize)]
pub struct RegisterForm {
    #[serde(rename = "p_full_name")]
    pub full_name: String,
    #[serde(rename = "p_email")]
    pub email: String,
    #[serde(rename = "p_phone")]
    pub phone: String,
    #[serde(rename = "p_password")]
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> AppResult<()> {
        if self.full_name.trim().is_empty() {
            return Err(AppError::validation("Full name is required"));
        }
        if !self.email.contains('@') {
            return Err(AppError::validation("Email is invalid"));
        }
        if self.password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }
        Ok(())
    }
}

/// 登录凭据
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "p_email")]
    pub email: String,
    #[serde(rename = "p_password")]
    pub password: String,
}

/// 登录结果
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: CurrentUser,
    /// 缓存写入是否成功；false 时本次登录不会跨进程保留
    pub persisted: bool,
}
