//! HWiNFO reading data source
//!
//! Follows one reading of one sensor from the shared [`SensorService`]. The
//! service is refreshed elsewhere (a poller or the CLI loop); `update` only
//! looks up the latest snapshot.

use crate::service::SensorService;
use anyhow::Result;
use hwsens_core::{DataSource, FieldMetadata, FieldPurpose, FieldType, SourceMetadata};
use hwsens_types::HwinfoSourceConfig;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Data source for a single HWiNFO reading
pub struct HwinfoSource {
    metadata: SourceMetadata,
    config: HwinfoSourceConfig,
    service: Arc<SensorService>,

    /// Cached output values - updated in update(), returned by reference in values_ref()
    values: HashMap<String, Value>,
}

impl HwinfoSource {
    pub fn new(service: Arc<SensorService>) -> Self {
        Self {
            metadata: SourceMetadata {
                id: "hwinfo".to_string(),
                name: "HWiNFO".to_string(),
                description: "Any reading published through HWiNFO shared memory".to_string(),
                available_keys: vec![
                    "value".to_string(),
                    "min".to_string(),
                    "max".to_string(),
                    "avg".to_string(),
                    "unit".to_string(),
                    "caption".to_string(),
                    "sensor_label".to_string(),
                    "reading_type".to_string(),
                    "poll_time".to_string(),
                    "min_limit".to_string(),
                    "max_limit".to_string(),
                ],
                default_interval: Duration::from_millis(1000),
            },
            config: HwinfoSourceConfig::default(),
            service,
            values: HashMap::with_capacity(12),
        }
    }

    pub fn with_config(service: Arc<SensorService>, config: HwinfoSourceConfig) -> Self {
        let mut source = Self::new(service);
        source.metadata.default_interval = Duration::from_millis(config.update_interval_ms);
        source.config = config;
        source
    }

    pub fn config(&self) -> &HwinfoSourceConfig {
        &self.config
    }

    fn insert_limits(&mut self) {
        if let Some(min) = self.config.min_limit {
            self.values.insert("min_limit".to_string(), Value::from(min));
        }
        if let Some(max) = self.config.max_limit {
            self.values.insert("max_limit".to_string(), Value::from(max));
        }
    }
}

impl DataSource for HwinfoSource {
    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    fn fields(&self) -> Vec<FieldMetadata> {
        vec![
            FieldMetadata::new(
                "value",
                "Value",
                "Current value of the selected reading",
                FieldType::Numerical,
                FieldPurpose::Value,
            ),
            FieldMetadata::new(
                "min",
                "Minimum",
                "Lowest value seen by the producer",
                FieldType::Numerical,
                FieldPurpose::SecondaryValue,
            ),
            FieldMetadata::new(
                "max",
                "Maximum",
                "Highest value seen by the producer",
                FieldType::Numerical,
                FieldPurpose::SecondaryValue,
            ),
            FieldMetadata::new(
                "avg",
                "Average",
                "Average value computed by the producer",
                FieldType::Numerical,
                FieldPurpose::SecondaryValue,
            ),
            FieldMetadata::new(
                "unit",
                "Unit",
                "Unit reported for the reading",
                FieldType::Text,
                FieldPurpose::Unit,
            ),
            FieldMetadata::new(
                "caption",
                "Caption",
                "Custom caption or the reading label",
                FieldType::Text,
                FieldPurpose::Caption,
            ),
            FieldMetadata::new(
                "sensor_label",
                "Sensor",
                "Name of the sensor owning the reading",
                FieldType::Text,
                FieldPurpose::Caption,
            ),
            FieldMetadata::new(
                "reading_type",
                "Type",
                "Reading category (Temp, Volt, Fan, ...)",
                FieldType::Text,
                FieldPurpose::Caption,
            ),
            FieldMetadata::new(
                "poll_time",
                "Poll Time",
                "When the producer last refreshed the segment",
                FieldType::Timestamp,
                FieldPurpose::Status,
            ),
            FieldMetadata::new(
                "min_limit",
                "Min Limit",
                "Minimum limit for visualization",
                FieldType::Numerical,
                FieldPurpose::SecondaryValue,
            ),
            FieldMetadata::new(
                "max_limit",
                "Max Limit",
                "Maximum limit for visualization",
                FieldType::Numerical,
                FieldPurpose::SecondaryValue,
            ),
        ]
    }

    fn update(&mut self) -> Result<()> {
        self.values.clear();

        let (Some(sensor_id), Some(reading_id)) =
            (self.config.sensor_id.clone(), self.config.reading_id)
        else {
            self.insert_limits();
            return Ok(());
        };

        let (sensor, reading) = match self.service.reading(&sensor_id, reading_id) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("HWiNFO selection {}:{} unavailable: {}", sensor_id, reading_id, e);
                self.insert_limits();
                return Ok(());
            }
        };

        let (sensor_label, label) = if self.config.use_user_labels {
            (sensor.display_name(), reading.display_label())
        } else {
            (sensor.name_orig.as_str(), reading.label_orig.as_str())
        };
        let caption = self
            .config
            .custom_caption
            .clone()
            .unwrap_or_else(|| label.to_string());

        self.values.insert("value".to_string(), Value::from(reading.value));
        self.values.insert("min".to_string(), Value::from(reading.min));
        self.values.insert("max".to_string(), Value::from(reading.max));
        self.values.insert("avg".to_string(), Value::from(reading.avg));
        self.values.insert("unit".to_string(), Value::from(reading.unit.as_str()));
        self.values.insert("caption".to_string(), Value::from(caption));
        self.values.insert("sensor_label".to_string(), Value::from(sensor_label));
        self.values.insert(
            "reading_type".to_string(),
            Value::from(reading.reading_type.as_str()),
        );
        if let Ok(poll_time) = self.service.poll_time() {
            self.values.insert("poll_time".to_string(), Value::from(poll_time));
        }
        self.insert_limits();

        Ok(())
    }

    fn get_values(&self) -> HashMap<String, Value> {
        self.values.clone()
    }

    fn values_ref(&self) -> Option<&HashMap<String, Value>> {
        Some(&self.values)
    }

    fn is_available(&self) -> bool {
        self.service.snapshot().is_some()
    }

    fn configure(&mut self, config: &HashMap<String, Value>) -> Result<()> {
        if let Some(config_value) = config.get("hwinfo_config") {
            self.config = serde_json::from_value(config_value.clone())?;
            self.metadata.default_interval = Duration::from_millis(self.config.update_interval_ms);
        }
        Ok(())
    }
}
