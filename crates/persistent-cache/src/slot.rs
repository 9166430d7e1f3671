//! 类型化缓存槽

use std::marker::PhantomData;
use std::sync::Arc;

use kulu_errors::AppResult;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::{PersistentCache, SaveReport};

/// 绑定到单个键和单个类型的缓存槽
///
/// 应用中所有需要跨会话保存的小状态（当前用户、管理员标记、设备标识）
/// 都通过槽访问，而不是直接读写存储层。
pub struct CacheSlot<T> {
    cache: Arc<PersistentCache>,
    key: &'static str,
    expiry_window: Option<chrono::Duration>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for CacheSlot<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key: self.key,
            expiry_window: self.expiry_window,
            _marker: PhantomData,
        }
    }
}

impl<T> CacheSlot<T>
where
    T: Serialize + DeserializeOwned,
{
    /// 使用缓存的默认有效期
    pub fn new(cache: Arc<PersistentCache>, key: &'static str) -> Self {
        let expiry_window = cache.options().expiry_window;
        Self {
            cache,
            key,
            expiry_window,
            _marker: PhantomData,
        }
    }

    /// 覆盖有效期，None 表示永不过期
    pub fn with_expiry(mut self, expiry_window: Option<chrono::Duration>) -> Self {
        self.expiry_window = expiry_window;
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub async fn save(&self, value: &T) -> AppResult<SaveReport> {
        self.cache.save(self.key, value).await
    }

    pub async fn load(&self) -> Option<T> {
        self.cache
            .load_with_expiry(self.key, self.expiry_window)
            .await
    }

    pub async fn remove(&self) {
        self.cache.remove(self.key).await
    }
}
