//! 存储层健康检查

use kulu_persistent_cache::PersistentCache;
use kulu_telemetry::HealthStatus;

use crate::Infrastructure;

/// 逐层探测缓存
pub async fn check_tiers(cache: &PersistentCache) -> HealthStatus {
    let mut status = HealthStatus::new();
    for probe in cache.probe().await {
        match probe.result {
            Ok(()) => status.add_check(probe.tier, true, None),
            Err(e) => status.add_check(probe.tier, false, Some(e.to_string())),
        }
    }
    status
}

/// 基础设施健康报告
///
/// 启动时没能打开的持久层也记为失败
pub async fn check_health(infra: &Infrastructure) -> HealthStatus {
    let mut status = check_tiers(&infra.cache()).await;
    if let Some(error) = infra.durable_error() {
        status.add_check("durable", false, Some(error.to_string()));
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use kulu_adapter_local::LocalFileTier;
    use kulu_adapter_session::SessionTier;
    use kulu_persistent_cache::CacheOptions;
    use kulu_ports::StorageTier;

    #[tokio::test]
    async fn test_all_tiers_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let tiers: Vec<Arc<dyn StorageTier>> = vec![
            Arc::new(LocalFileTier::new(dir.path())) as Arc<dyn StorageTier>,
            Arc::new(SessionTier::default()) as Arc<dyn StorageTier>,
        ];
        let cache = PersistentCache::new(tiers, CacheOptions::default());

        let status = check_tiers(&cache).await;
        assert!(status.healthy);
        assert_eq!(status.healthy_count(), 2);
    }

    #[tokio::test]
    async fn test_file_in_place_of_dir_is_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let tiers: Vec<Arc<dyn StorageTier>> =
            vec![Arc::new(LocalFileTier::new(blocker)) as Arc<dyn StorageTier>];
        let cache = PersistentCache::new(tiers, CacheOptions::default());

        let status = check_tiers(&cache).await;
        assert!(!status.healthy);
        assert!(status.to_string().ends_with("0/1 checks healthy"));
    }
}
