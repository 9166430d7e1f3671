//! 缓存记录与校验

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 当前记录结构版本，结构不兼容时升级
pub const SCHEMA_VERSION: &str = "1.0";

/// 默认有效期（30 天）
pub fn default_expiry_window() -> Duration {
    Duration::days(30)
}

/// 存储在各层中的记录
///
/// 线上格式：`{ "user": <payload>, "timestamp": <ms>, "version": "1.0" }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRecord<T> {
    #[serde(rename = "user")]
    pub payload: T,
    /// 写入时间（Unix 毫秒），由缓存设置
    pub timestamp: i64,
    #[serde(rename = "version")]
    pub schema_version: String,
}

impl<T> CachedRecord<T> {
    pub fn new(payload: T, timestamp: i64, schema_version: impl Into<String>) -> Self {
        Self {
            payload,
            timestamp,
            schema_version: schema_version.into(),
        }
    }
}

/// 记录校验规则
#[derive(Debug, Clone)]
pub struct RecordValidator {
    schema_version: String,
    /// None 表示永不过期
    expiry_window: Option<Duration>,
}

impl RecordValidator {
    pub fn new(schema_version: impl Into<String>, expiry_window: Option<Duration>) -> Self {
        Self {
            schema_version: schema_version.into(),
            expiry_window,
        }
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn expiry_window(&self) -> Option<Duration> {
        self.expiry_window
    }

    /// 判断原始记录是否有效
    ///
    /// - `user`、`timestamp`、`version` 任一缺失（或为 null）：无效
    /// - 版本不等于当前版本：无效
    /// - `now - timestamp` 超过有效期：无效
    pub fn is_valid_data(&self, raw: &Value, now_millis: i64) -> bool {
        let Some(record) = raw.as_object() else {
            return false;
        };

        let payload_present = record.get("user").is_some_and(|v| !v.is_null());
        let timestamp = record.get("timestamp").and_then(timestamp_millis);
        let version = record.get("version").and_then(Value::as_str);

        let (Some(timestamp), Some(version)) = (timestamp, version) else {
            return false;
        };
        if !payload_present || version != self.schema_version {
            return false;
        }

        match self.expiry_window {
            Some(window) => now_millis.saturating_sub(timestamp) <= window.num_milliseconds(),
            None => true,
        }
    }

    /// 解析并校验序列化记录，返回其中的 payload
    pub fn extract_payload(&self, serialized: &str, now_millis: i64) -> Option<Value> {
        let raw: Value = serde_json::from_str(serialized).ok()?;
        if !self.is_valid_data(&raw, now_millis) {
            return None;
        }
        match raw {
            Value::Object(mut record) => record.remove("user"),
            _ => None,
        }
    }
}

/// 时间戳可能以浮点数写入
fn timestamp_millis(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_760_000_000_000;

    fn validator() -> RecordValidator {
        RecordValidator::new(SCHEMA_VERSION, Some(default_expiry_window()))
    }

    #[test]
    fn test_record_wire_format() {
        let record = CachedRecord::new(json!({"id": "u1"}), NOW, SCHEMA_VERSION);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"user": {"id": "u1"}, "timestamp": NOW, "version": "1.0"})
        );
    }

    #[test]
    fn test_fresh_record_is_valid() {
        let raw = json!({"user": {"id": "u1"}, "timestamp": NOW - 1_000, "version": "1.0"});
        assert!(validator().is_valid_data(&raw, NOW));
    }

    #[test]
    fn test_missing_fields_are_invalid() {
        let v = validator();
        assert!(!v.is_valid_data(&json!({"timestamp": NOW, "version": "1.0"}), NOW));
        assert!(!v.is_valid_data(&json!({"user": {}, "version": "1.0"}), NOW));
        assert!(!v.is_valid_data(&json!({"user": {}, "timestamp": NOW}), NOW));
        assert!(!v.is_valid_data(&json!({"user": null, "timestamp": NOW, "version": "1.0"}), NOW));
        assert!(!v.is_valid_data(&json!("not a record"), NOW));
    }

    #[test]
    fn test_version_mismatch_is_invalid() {
        let raw = json!({"user": {"id": "u1"}, "timestamp": NOW, "version": "0.9"});
        assert!(!validator().is_valid_data(&raw, NOW));
    }

    #[test]
    fn test_expiry_boundary() {
        let window = default_expiry_window().num_milliseconds();
        let v = validator();

        let at_edge = json!({"user": 1, "timestamp": NOW - window, "version": "1.0"});
        assert!(v.is_valid_data(&at_edge, NOW));

        let past_edge = json!({"user": 1, "timestamp": NOW - window - 1, "version": "1.0"});
        assert!(!v.is_valid_data(&past_edge, NOW));
    }

    #[test]
    fn test_future_timestamp_is_valid() {
        let raw = json!({"user": 1, "timestamp": NOW + 60_000, "version": "1.0"});
        assert!(validator().is_valid_data(&raw, NOW));
    }

    #[test]
    fn test_float_timestamp_is_accepted() {
        let raw = json!({"user": 1, "timestamp": (NOW as f64) + 0.5, "version": "1.0"});
        assert!(validator().is_valid_data(&raw, NOW));
    }

    #[test]
    fn test_no_expiry_window() {
        let v = RecordValidator::new(SCHEMA_VERSION, None);
        let ancient = json!({"user": "device-1", "timestamp": 0, "version": "1.0"});
        assert!(v.is_valid_data(&ancient, NOW));
    }

    #[test]
    fn test_extract_payload() {
        let v = validator();
        let serialized = format!(
            r#"{{"user":{{"id":"u1"}},"timestamp":{},"version":"1.0"}}"#,
            NOW
        );
        assert_eq!(v.extract_payload(&serialized, NOW), Some(json!({"id": "u1"})));
        assert_eq!(v.extract_payload("{broken", NOW), None);
    }
}
