//! telemetry - 可观测性库

use std::fmt;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化 tracing
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 重复初始化时保留已有 subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// 初始化 JSON 格式的 tracing
pub fn init_tracing_json(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .try_init();
}

/// 安装 Prometheus recorder，返回用于渲染指标的 handle
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// 健康检查状态
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub checks: Vec<HealthCheck>,
}

#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub name: String,
    pub healthy: bool,
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self {
            healthy: true,
            checks: Vec::new(),
        }
    }

    pub fn add_check(&mut self, name: impl Into<String>, healthy: bool, message: Option<String>) {
        if !healthy {
            self.healthy = false;
        }
        self.checks.push(HealthCheck {
            name: name.into(),
            healthy,
            message,
        });
    }

    /// 健康的检查项数量
    pub fn healthy_count(&self) -> usize {
        self.checks.iter().filter(|c| c.healthy).count()
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            let state = if check.healthy { "ok" } else { "FAIL" };
            match &check.message {
                Some(message) => writeln!(f, "{:<10} {:<5} {}", check.name, state, message)?,
                None => writeln!(f, "{:<10} {}", check.name, state)?,
            }
        }
        write!(
            f,
            "{}/{} checks healthy",
            self.healthy_count(),
            self.checks.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_failure_marks_unhealthy() {
        let mut status = HealthStatus::new();
        status.add_check("local", true, None);
        status.add_check("durable", false, Some("timed out".to_string()));

        assert!(!status.healthy);
        assert_eq!(status.healthy_count(), 1);
    }

    #[test]
    fn test_display_lists_every_check() {
        let mut status = HealthStatus::default();
        status.add_check("session", true, None);
        status.add_check("durable", false, Some("locked".to_string()));

        let rendered = status.to_string();
        assert!(rendered.contains("session"));
        assert!(rendered.contains("FAIL"));
        assert!(rendered.ends_with("1/2 checks healthy"));
    }
}
