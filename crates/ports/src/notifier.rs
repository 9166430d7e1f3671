//! 通知 trait 定义

use async_trait::async_trait;
use derive_more::Display;
use kulu_common::{ListingId, UserId};

/// 管理员操作触发的通知事件
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum NotificationEvent {
    #[display("user_approved({_0})")]
    UserApproved(UserId),
    #[display("user_rejected({_0})")]
    UserRejected(UserId),
    #[display("listing_approved({_0})")]
    ListingApproved(ListingId),
    #[display("listing_rejected({_0})")]
    ListingRejected(ListingId),
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserApproved(_) => "user_approved",
            Self::UserRejected(_) => "user_rejected",
            Self::ListingApproved(_) => "listing_approved",
            Self::ListingRejected(_) => "listing_rejected",
        }
    }
}

/// 推送通知（fire-and-forget）
///
/// 返回是否发送成功，调用方不因失败而中断
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &NotificationEvent) -> bool;
}

/// 日志通知实现
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, event: &NotificationEvent) -> bool {
        tracing::info!(event = %event, kind = event.kind(), "Notification dispatched");
        true
    }
}

/// 空操作通知实现（用于测试或禁用通知场景）
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _event: &NotificationEvent) -> bool {
        true
    }
}
