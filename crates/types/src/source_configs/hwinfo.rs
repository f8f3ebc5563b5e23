//! HWiNFO reading source configuration types.

use serde::{Deserialize, Serialize};

fn default_update_interval() -> u64 {
    1000
}

fn default_use_user_labels() -> bool {
    true
}

/// Configuration for a source that follows one reading of one sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HwinfoSourceConfig {
    /// Legacy sensor id (`sensor_id * 100 + instance`)
    #[serde(default)]
    pub sensor_id: Option<String>,
    /// Reading id within the sensor
    #[serde(default)]
    pub reading_id: Option<u32>,
    #[serde(default)]
    pub custom_caption: Option<String>,
    #[serde(default = "default_use_user_labels")]
    pub use_user_labels: bool,
    #[serde(default = "default_update_interval")]
    pub update_interval_ms: u64,
    #[serde(default)]
    pub min_limit: Option<f64>,
    #[serde(default)]
    pub max_limit: Option<f64>,
}

impl Default for HwinfoSourceConfig {
    fn default() -> Self {
        Self {
            sensor_id: None,
            reading_id: None,
            custom_caption: None,
            use_user_labels: default_use_user_labels(),
            update_interval_ms: default_update_interval(),
            min_limit: None,
            max_limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: HwinfoSourceConfig =
            serde_json::from_str(r#"{"sensor_id":"10000","reading_id":7}"#).unwrap();
        assert_eq!(config.sensor_id.as_deref(), Some("10000"));
        assert_eq!(config.reading_id, Some(7));
        assert_eq!(config.update_interval_ms, 1000);
        assert!(config.use_user_labels);
    }

    #[test]
    fn test_configs_with_retired_timeout_still_load() {
        let config: HwinfoSourceConfig = serde_json::from_str(
            r#"{"sensor_id":"20001","reading_id":3,"mutex_timeout_ms":500}"#,
        )
        .unwrap();
        assert_eq!(config.sensor_id.as_deref(), Some("20001"));
        assert_eq!(config.reading_id, Some(3));
        assert!(!serde_json::to_string(&config).unwrap().contains("mutex_timeout_ms"));
    }
}
