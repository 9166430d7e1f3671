//! 多层持久化缓存实现

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use kulu_common::{Clock, SystemClock};
use kulu_errors::{AppError, AppResult};
use kulu_ports::StorageTier;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::record::{CachedRecord, RecordValidator, SCHEMA_VERSION, default_expiry_window};
use crate::stats;

/// 单个存储层操作的默认超时
pub const DEFAULT_TIER_TIMEOUT: Duration = Duration::from_secs(3);

/// 缓存配置
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// 记录结构版本
    pub schema_version: String,
    /// 默认有效期，None 表示永不过期
    pub expiry_window: Option<chrono::Duration>,
    /// 单个存储层操作的超时，超时视为该层失败
    pub tier_timeout: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            expiry_window: Some(default_expiry_window()),
            tier_timeout: DEFAULT_TIER_TIMEOUT,
        }
    }
}

impl CacheOptions {
    pub fn with_expiry_window(mut self, window: Option<chrono::Duration>) -> Self {
        self.expiry_window = window;
        self
    }

    pub fn with_tier_timeout(mut self, timeout: Duration) -> Self {
        self.tier_timeout = timeout;
        self
    }

    pub fn with_schema_version(mut self, version: impl Into<String>) -> Self {
        self.schema_version = version.into();
        self
    }
}

/// 单次写入结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// 写入成功的存储层
    pub written: Vec<&'static str>,
    /// 写入失败的存储层及原因
    pub failed: Vec<(&'static str, String)>,
    /// 是否经过了快速层兜底重试
    pub fallback_used: bool,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 存储层探测结果
#[derive(Debug)]
pub struct TierProbe {
    pub tier: &'static str,
    pub result: AppResult<()>,
}

/// 多层持久化缓存
///
/// 存储层按优先级排列：第一个是最快的层，最后一个是最持久的层。
/// 除存储层句柄外不持有任何状态，所有数据都在存储层中。
pub struct PersistentCache {
    tiers: Vec<Arc<dyn StorageTier>>,
    clock: Arc<dyn Clock>,
    options: CacheOptions,
}

impl PersistentCache {
    pub fn new(tiers: Vec<Arc<dyn StorageTier>>, options: CacheOptions) -> Self {
        Self {
            tiers,
            clock: Arc::new(SystemClock),
            options,
        }
    }

    /// 替换时钟（测试中注入手动时钟）
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn tiers(&self) -> &[Arc<dyn StorageTier>] {
        &self.tiers
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    fn validator(&self, expiry_window: Option<chrono::Duration>) -> RecordValidator {
        RecordValidator::new(self.options.schema_version.clone(), expiry_window)
    }

    /// 按默认有效期校验原始记录
    pub fn is_valid_data(&self, raw: &serde_json::Value) -> bool {
        self.validator(self.options.expiry_window)
            .is_valid_data(raw, self.clock.now_millis())
    }

    /// 写入记录
    ///
    /// 序列化一次后按顺序写入所有存储层，单层失败只记录不中断。
    /// 所有层都失败时再单独重试一次快速层，仍失败则返回
    /// `StorageUnavailable`，这是唯一会向调用方报错的路径。
    pub async fn save<T>(&self, key: &str, payload: &T) -> AppResult<SaveReport>
    where
        T: Serialize + ?Sized,
    {
        let record = CachedRecord::new(
            payload,
            self.clock.now_millis(),
            self.options.schema_version.as_str(),
        );
        let serialized = serde_json::to_string(&record)?;

        let mut report = SaveReport::default();
        for tier in &self.tiers {
            match self
                .guarded(tier.as_ref(), "set", tier.set(key, &serialized))
                .await
            {
                Ok(()) => report.written.push(tier.name()),
                Err(e) => report.failed.push((tier.name(), e.to_string())),
            }
        }

        if report.written.is_empty() {
            let Some(fast) = self.tiers.first() else {
                return Err(AppError::storage_unavailable("no storage tiers configured"));
            };

            warn!(key = %key, tier = fast.name(), "Every storage tier rejected the write, retrying fast tier");
            self.guarded(fast.as_ref(), "set", fast.set(key, &serialized))
                .await
                .map_err(|e| {
                    AppError::storage_unavailable(format!(
                        "could not persist '{}' to any storage tier: {}",
                        key, e
                    ))
                })?;
            report.written.push(fast.name());
            report.fallback_used = true;
        }

        debug!(
            key = %key,
            written = ?report.written,
            failed = report.failed.len(),
            "Cache record saved"
        );
        Ok(report)
    }

    /// 按默认有效期读取记录
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.load_with_expiry(key, self.options.expiry_window).await
    }

    /// 按指定有效期读取记录
    ///
    /// 依次查找各存储层，返回第一个有效记录；命中非首层时把原记录
    /// 回填到所有更快的层。任何错误都当作未命中，不会向调用方报错。
    pub async fn load_with_expiry<T: DeserializeOwned>(
        &self,
        key: &str,
        expiry_window: Option<chrono::Duration>,
    ) -> Option<T> {
        let validator = self.validator(expiry_window);

        for (index, tier) in self.tiers.iter().enumerate() {
            let raw = match self.guarded(tier.as_ref(), "get", tier.get(key)).await {
                Ok(Some(raw)) => raw,
                Ok(None) | Err(_) => continue,
            };

            let Some(payload) = validator.extract_payload(&raw, self.clock.now_millis()) else {
                debug!(key = %key, tier = tier.name(), "Stale or malformed cache record ignored");
                stats::record_invalid(tier.name());
                continue;
            };

            let payload = match serde_json::from_value::<T>(payload) {
                Ok(payload) => payload,
                Err(e) => {
                    debug!(key = %key, tier = tier.name(), error = %e, "Cached payload has unexpected shape");
                    stats::record_invalid(tier.name());
                    continue;
                }
            };

            stats::record_hit(tier.name());
            if index > 0 {
                self.repair(key, &raw, &self.tiers[..index]).await;
            }
            return Some(payload);
        }

        stats::record_miss();
        None
    }

    /// 回填更快的存储层，失败只记录日志
    async fn repair(&self, key: &str, raw: &str, faster: &[Arc<dyn StorageTier>]) {
        for tier in faster {
            if self
                .guarded(tier.as_ref(), "repair", tier.set(key, raw))
                .await
                .is_ok()
            {
                stats::record_repair(tier.name());
                debug!(key = %key, tier = tier.name(), "Cache tier repaired");
            }
        }
    }

    /// 从所有存储层删除记录，从不报错
    ///
    /// 有层删除失败时，再对最简单的两层做一次兜底删除
    pub async fn remove(&self, key: &str) {
        let mut any_failed = false;
        for tier in &self.tiers {
            if self
                .guarded(tier.as_ref(), "delete", tier.delete(key))
                .await
                .is_err()
            {
                any_failed = true;
            }
        }

        if any_failed {
            for tier in self.tiers.iter().take(2) {
                let _ = self
                    .guarded(tier.as_ref(), "delete", tier.delete(key))
                    .await;
            }
        }

        debug!(key = %key, "Cache record removed");
    }

    /// 探测每个存储层是否可用
    pub async fn probe(&self) -> Vec<TierProbe> {
        let mut probes = Vec::with_capacity(self.tiers.len());
        for tier in &self.tiers {
            let result = self.guarded(tier.as_ref(), "ping", tier.ping()).await;
            probes.push(TierProbe {
                tier: tier.name(),
                result,
            });
        }
        probes
    }

    /// 给存储层操作加超时，并统一记录失败
    async fn guarded<T, F>(&self, tier: &dyn StorageTier, op: &'static str, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        let result = match tokio::time::timeout(self.options.tier_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::timeout(format!(
                "{} tier {} timed out after {:?}",
                tier.name(),
                op,
                self.options.tier_timeout
            ))),
        };

        if let Err(e) = &result {
            warn!(tier = tier.name(), op, error = %e, "Storage tier operation failed");
            stats::record_tier_failure(tier.name(), op);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// 可切换故障的内存存储层
    struct FlakyTier {
        name: &'static str,
        data: Mutex<HashMap<String, String>>,
        failing: AtomicBool,
        /// 接下来要失败的写入次数
        failing_sets: AtomicUsize,
        set_calls: AtomicUsize,
    }

    impl FlakyTier {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                data: Mutex::new(HashMap::new()),
                failing: AtomicBool::new(false),
                failing_sets: AtomicUsize::new(0),
                set_calls: AtomicUsize::new(0),
            })
        }

        fn fail(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn fail_next_sets(&self, count: usize) {
            self.failing_sets.store(count, Ordering::SeqCst);
        }

        fn check(&self) -> AppResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                Err(AppError::internal(format!("{} unavailable", self.name)))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl StorageTier for FlakyTier {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn get(&self, key: &str) -> AppResult<Option<String>> {
            self.check()?;
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> AppResult<()> {
            self.set_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            if self
                .failing_sets
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(AppError::internal(format!("{} write rejected", self.name)));
            }
            self.data
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.check()?;
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn cache_over(tiers: &[Arc<FlakyTier>]) -> PersistentCache {
        let tiers = tiers
            .iter()
            .map(|t| t.clone() as Arc<dyn StorageTier>)
            .collect();
        PersistentCache::new(tiers, CacheOptions::default())
    }

    #[tokio::test]
    async fn test_save_reports_partial_failure() {
        let fast = FlakyTier::new("local");
        let session = FlakyTier::new("session");
        session.fail(true);
        let cache = cache_over(&[fast.clone(), session.clone()]);

        let report = cache.save("k", &"v").await.unwrap();

        assert_eq!(report.written, vec!["local"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "session");
        assert!(!report.fallback_used);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_total_write_failure_retries_fast_tier_once() {
        let fast = FlakyTier::new("local");
        let session = FlakyTier::new("session");
        fast.fail(true);
        session.fail(true);
        let cache = cache_over(&[fast.clone(), session.clone()]);

        let err = cache.save("k", &"v").await.unwrap_err();

        assert!(matches!(err, AppError::StorageUnavailable(_)));
        assert_eq!(fast.set_calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.set_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fast_tier_retry_rescues_total_write_failure() {
        let fast = FlakyTier::new("local");
        let session = FlakyTier::new("session");
        fast.fail_next_sets(1);
        session.fail(true);
        let cache = cache_over(&[fast.clone(), session.clone()]);

        let report = cache.save("k", &"v").await.unwrap();

        assert!(report.fallback_used);
        assert_eq!(report.written, vec!["local"]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(fast.set_calls.load(Ordering::SeqCst), 2);

        session.fail(false);
        assert_eq!(cache.load::<String>("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_schema_version_change_invalidates_records() {
        let fast = FlakyTier::new("local");
        let tiers = vec![fast.clone() as Arc<dyn StorageTier>];
        let old = PersistentCache::new(tiers.clone(), CacheOptions::default());
        old.save("k", &"v").await.unwrap();

        let upgraded = PersistentCache::new(
            tiers,
            CacheOptions::default().with_schema_version("2.0"),
        );
        assert_eq!(upgraded.load::<String>("k").await, None);

        upgraded.save("k", &"w").await.unwrap();
        assert_eq!(upgraded.load::<String>("k").await.as_deref(), Some("w"));
        assert_eq!(old.load::<String>("k").await, None);
    }

    #[tokio::test]
    async fn test_no_tiers_is_storage_unavailable() {
        let cache = PersistentCache::new(Vec::new(), CacheOptions::default());
        let err = cache.save("k", &1).await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
        assert_eq!(cache.load::<i32>("k").await, None);
        cache.remove("k").await;
    }

    #[tokio::test]
    async fn test_wrong_payload_type_reads_as_absent() {
        let fast = FlakyTier::new("local");
        let cache = cache_over(&[fast]);

        cache.save("k", &"not a number").await.unwrap();
        assert_eq!(cache.load::<u64>("k").await, None);
        assert_eq!(cache.load::<String>("k").await.as_deref(), Some("not a number"));
    }

    #[tokio::test]
    async fn test_remove_tolerates_failing_tier() {
        let fast = FlakyTier::new("local");
        let durable = FlakyTier::new("durable");
        let cache = cache_over(&[fast.clone(), durable.clone()]);

        cache.save("k", &1).await.unwrap();
        durable.fail(true);
        cache.remove("k").await;

        assert!(fast.data.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_probe_reports_each_tier() {
        let fast = FlakyTier::new("local");
        let durable = FlakyTier::new("durable");
        durable.fail(true);
        let cache = cache_over(&[fast, durable]);

        let probes = cache.probe().await;
        assert_eq!(probes.len(), 2);
        assert!(probes[0].result.is_ok());
        assert_eq!(probes[1].tier, "durable");
        assert!(probes[1].result.is_err());
    }
}
