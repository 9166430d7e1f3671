//! 会话与认证门面
//!
//! 所有"当前是谁登录"的状态都经由缓存槽读写，不另外保存

use std::sync::Arc;

use kulu_common::{ListingId, UserId, UserStatus, utils::random_id};
use kulu_errors::{AppError, AppResult};
use kulu_persistent_cache::{
    ADMIN_FLAG_KEY, CacheSlot, DEVICE_ID_KEY, PersistentCache, USER_STORAGE_KEY,
};
use kulu_ports::{BackendRpc, NotificationEvent, Notifier, RpcResponse};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::forms::{Credentials, LoginOutcome, RegisterForm};
use crate::domain::CurrentUser;

/// 会话服务
pub struct SessionService {
    backend: Arc<dyn BackendRpc>,
    notifier: Arc<dyn Notifier>,
    current_user: CacheSlot<CurrentUser>,
    admin_flag: CacheSlot<bool>,
    device_id: CacheSlot<String>,
}

impl SessionService {
    pub fn new(
        cache: Arc<PersistentCache>,
        backend: Arc<dyn BackendRpc>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            notifier,
            current_user: CacheSlot::new(cache.clone(), USER_STORAGE_KEY),
            admin_flag: CacheSlot::new(cache.clone(), ADMIN_FLAG_KEY),
            device_id: CacheSlot::new(cache, DEVICE_ID_KEY).with_expiry(None),
        }
    }

    /// 注册新用户
    ///
    /// 后端直接批准时视为已登录并写入缓存，待审核用户不写缓存
    pub async fn register(&self, form: &RegisterForm) -> AppResult<CurrentUser> {
        form.validate()?;

        let user = self.call_for_user("register_user", form).await?;
        info!(user_id = %user.id, status = %user.status, "User registered");

        if user.is_approved() {
            self.remember(&user).await;
        }
        Ok(user)
    }

    /// 登录
    pub async fn login(&self, credentials: &Credentials) -> AppResult<LoginOutcome> {
        let user = self.call_for_user("login_user", credentials).await?;

        match &user.status {
            UserStatus::Pending => {
                info!(user_id = %user.id, "Login refused, account awaiting approval");
                return Err(AppError::forbidden("Account is awaiting admin approval"));
            }
            UserStatus::Rejected => {
                info!(user_id = %user.id, "Login refused, account rejected");
                return Err(AppError::forbidden("Account has been rejected"));
            }
            UserStatus::Approved | UserStatus::Other(_) => {}
        }

        let persisted = self.remember(&user).await;
        info!(user_id = %user.id, role = %user.role, persisted, "User logged in");
        Ok(LoginOutcome { user, persisted })
    }

    /// 登出，设备标识保留
    pub async fn logout(&self) {
        self.current_user.remove().await;
        self.admin_flag.remove().await;
        info!("User logged out");
    }

    pub async fn current_user(&self) -> Option<CurrentUser> {
        self.current_user.load().await
    }

    pub async fn is_admin(&self) -> bool {
        self.admin_flag.load().await.unwrap_or(false)
    }

    /// 读取设备标识，首次使用时生成
    pub async fn device_id_or_init(&self) -> String {
        if let Some(id) = self.device_id.load().await {
            return id;
        }

        let id = random_id().to_string();
        if let Err(e) = self.device_id.save(&id).await {
            warn!(error = %e, "Failed to persist device id");
        }
        debug!(device_id = %id, "Device id generated");
        id
    }

    pub async fn approve_user(&self, user_id: &UserId) -> AppResult<()> {
        self.require_admin().await?;

        let returned = self
            .call_admin("approve_user", json!({ "p_user_id": user_id }))
            .await?;
        self.refresh_if_current(user_id, returned).await;

        self.dispatch(NotificationEvent::UserApproved(user_id.clone()))
            .await;
        Ok(())
    }

    pub async fn reject_user(&self, user_id: &UserId, reason: Option<&str>) -> AppResult<()> {
        self.require_admin().await?;

        self.call_admin(
            "reject_user",
            json!({ "p_user_id": user_id, "p_reason": reason }),
        )
        .await?;

        self.dispatch(NotificationEvent::UserRejected(user_id.clone()))
            .await;
        Ok(())
    }

    pub async fn approve_listing(&self, listing_id: &ListingId) -> AppResult<()> {
        self.require_admin().await?;

        self.call_admin("approve_listing", json!({ "p_listing_id": listing_id }))
            .await?;

        self.dispatch(NotificationEvent::ListingApproved(listing_id.clone()))
            .await;
        Ok(())
    }

    pub async fn reject_listing(
        &self,
        listing_id: &ListingId,
        reason: Option<&str>,
    ) -> AppResult<()> {
        self.require_admin().await?;

        self.call_admin(
            "reject_listing",
            json!({ "p_listing_id": listing_id, "p_reason": reason }),
        )
        .await?;

        self.dispatch(NotificationEvent::ListingRejected(listing_id.clone()))
            .await;
        Ok(())
    }

    pub async fn delete_listing(&self, listing_id: &ListingId) -> AppResult<()> {
        self.require_admin().await?;
        self.call_admin("delete_listing", json!({ "p_listing_id": listing_id }))
            .await?;
        info!(listing_id = %listing_id, "Listing deleted");
        Ok(())
    }

    pub async fn set_listing_featured(
        &self,
        listing_id: &ListingId,
        featured: bool,
    ) -> AppResult<()> {
        self.require_admin().await?;
        self.call_admin(
            "toggle_listing_featured",
            json!({ "p_listing_id": listing_id, "p_featured": featured }),
        )
        .await?;
        info!(listing_id = %listing_id, featured, "Listing featured flag updated");
        Ok(())
    }

    /// 调用返回用户的认证类 RPC
    async fn call_for_user<P: Serialize>(&self, function: &str, params: &P) -> AppResult<CurrentUser> {
        let params = serde_json::to_value(params)?;
        let value = self.backend.call(function, params).await?;
        let user = RpcResponse::from_value(value)?
            .into_result(function)?
            .ok_or_else(|| AppError::external_service(format!("{} returned no user", function)))?;
        parse_user(function, user)
    }

    /// 调用管理类 RPC
    ///
    /// 无返回值的过程视为成功；带 `success` 字段的返回按认证类结构解析
    async fn call_admin(&self, function: &str, params: Value) -> AppResult<Option<Value>> {
        let value = self.backend.call(function, params).await?;
        let shaped = value
            .as_object()
            .is_some_and(|object| object.contains_key("success"));
        if shaped {
            RpcResponse::from_value(value)?.into_result(function)
        } else {
            Ok(None)
        }
    }

    async fn require_admin(&self) -> AppResult<()> {
        if self.is_admin().await {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin privileges required"))
        }
    }

    /// 写入当前用户和管理员标记，返回是否全部写入
    async fn remember(&self, user: &CurrentUser) -> bool {
        let mut persisted = true;
        if let Err(e) = self.current_user.save(user).await {
            warn!(user_id = %user.id, error = %e, "Failed to cache current user");
            persisted = false;
        }
        if let Err(e) = self.admin_flag.save(&user.is_admin()).await {
            warn!(user_id = %user.id, error = %e, "Failed to cache admin flag");
            persisted = false;
        }
        persisted
    }

    async fn refresh_if_current(&self, user_id: &UserId, returned: Option<Value>) {
        let Some(current) = self.current_user.load().await else {
            return;
        };
        if &current.id != user_id {
            return;
        }

        match returned.map(|value| parse_user("approve_user", value)) {
            Some(Ok(user)) => {
                self.remember(&user).await;
            }
            Some(Err(e)) => warn!(error = %e, "Ignoring malformed user from approve_user"),
            None => {
                let mut user = current;
                user.status = UserStatus::Approved;
                self.remember(&user).await;
            }
        }
        debug!(user_id = %user_id, "Cached current user refreshed");
    }

    async fn dispatch(&self, event: NotificationEvent) {
        if !self.notifier.notify(&event).await {
            warn!(event = %event, "Notification delivery failed");
        }
    }
}

fn parse_user(function: &str, value: Value) -> AppResult<CurrentUser> {
    serde_json::from_value(value).map_err(|e| {
        AppError::external_service(format!("{} returned a malformed user: {}", function, e))
    })
}
