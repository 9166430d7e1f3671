//! 会话内存存储层实现

use async_trait::async_trait;
use kulu_errors::AppResult;
use kulu_ports::StorageTier;
use moka::sync::Cache;

/// 默认最大条目数
pub const DEFAULT_SESSION_CAPACITY: u64 = 64;

/// 会话存储层（Moka 内存缓存）
#[derive(Clone)]
pub struct SessionTier {
    entries: Cache<String, String>,
}

impl SessionTier {
    pub fn new(max_capacity: u64) -> Self {
        let entries = Cache::builder().max_capacity(max_capacity).build();
        Self { entries }
    }

    /// 当前条目数
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空会话（模拟标签页关闭）
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for SessionTier {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAPACITY)
    }
}

#[async_trait]
impl StorageTier for SessionTier {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.invalidate(key);
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let tier = SessionTier::default();

        tier.set("kulu_ilan_user", "v1").await.unwrap();
        assert_eq!(tier.get("kulu_ilan_user").await.unwrap().as_deref(), Some("v1"));

        tier.delete("kulu_ilan_user").await.unwrap();
        assert_eq!(tier.get("kulu_ilan_user").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let tier = SessionTier::new(8);
        let other = tier.clone();

        tier.set("k", "v").await.unwrap();
        assert_eq!(other.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let tier = SessionTier::default();
        tier.set("a", "1").await.unwrap();
        tier.set("b", "2").await.unwrap();
        assert_eq!(tier.len(), 2);

        tier.clear();
        assert_eq!(tier.get("a").await.unwrap(), None);
        assert_eq!(tier.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let tier = SessionTier::default();
        assert!(tier.delete("missing").await.is_ok());
    }
}
