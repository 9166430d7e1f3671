//! 通用类型定义

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// 用户 ID（由后端分配）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
#[display("{_0}")]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 房产信息 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
#[display("{_0}")]
pub struct ListingId(pub String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 用户角色
///
/// 未识别的角色保存在 `Other` 中，不授予任何管理权限
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    #[default]
    #[display("user")]
    User,
    #[display("admin")]
    Admin,
    #[display("{_0}")]
    Other(String),
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Self::User,
            "admin" => Self::Admin,
            _ => Self::Other(value),
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.to_string()
    }
}

/// 用户审核状态
///
/// 未识别的状态保存在 `Other` 中，既不算已批准也不算待审核
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
#[serde(from = "String", into = "String")]
pub enum UserStatus {
    #[default]
    #[display("pending")]
    Pending,
    #[display("approved")]
    Approved,
    #[display("rejected")]
    Rejected,
    #[display("{_0}")]
    Other(String),
}

impl From<String> for UserStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Other(value),
        }
    }
}

impl From<UserStatus> for String {
    fn from(status: UserStatus) -> Self {
        status.to_string()
    }
}
