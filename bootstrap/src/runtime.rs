//! 运行时初始化

use kulu_config::AppConfig;
use kulu_telemetry::{init_metrics, init_tracing, init_tracing_json};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

/// 初始化日志
pub fn init_runtime(config: &AppConfig) {
    if config.telemetry.json || config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );
}

/// 安装 Prometheus 记录器，失败时不影响运行
pub fn install_metrics() -> Option<PrometheusHandle> {
    match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Failed to install metrics recorder");
            None
        }
    }
}
