//! 缓存指标（Prometheus 计数器）

use metrics::counter;

pub(crate) fn record_hit(tier: &'static str) {
    counter!("kulu_cache_hits_total", "tier" => tier).increment(1);
}

pub(crate) fn record_miss() {
    counter!("kulu_cache_misses_total").increment(1);
}

pub(crate) fn record_repair(tier: &'static str) {
    counter!("kulu_cache_repairs_total", "tier" => tier).increment(1);
}

pub(crate) fn record_tier_failure(tier: &'static str, op: &'static str) {
    counter!("kulu_cache_tier_failures_total", "tier" => tier, "op" => op).increment(1);
}

pub(crate) fn record_invalid(tier: &'static str) {
    counter!("kulu_cache_invalid_records_total", "tier" => tier).increment(1);
}
