//! 当前用户

use kulu_common::{UserId, UserRole, UserStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 已登录用户
///
/// 后端返回的未知字段保存在 `extra` 中，写回缓存时原样保留
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_approved(&self) -> bool {
        self.status == UserStatus::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "id": "u1",
            "full_name": "Ali Veli",
            "role": "admin",
            "status": "approved",
            "avatar_url": "https://cdn.example.com/a.png"
        });

        let user: CurrentUser = serde_json::from_value(raw.clone()).unwrap();
        assert!(user.is_admin());
        assert!(user.is_approved());
        assert_eq!(user.extra["avatar_url"], "https://cdn.example.com/a.png");

        assert_eq!(serde_json::to_value(&user).unwrap(), raw);
    }

    #[test]
    fn test_missing_role_defaults_to_user() {
        let user: CurrentUser =
            serde_json::from_value(json!({"id": "u2", "full_name": "Ayşe", "status": "pending"}))
                .unwrap();
        assert_eq!(user.role, UserRole::User);
        assert!(!user.is_approved());
    }
}
