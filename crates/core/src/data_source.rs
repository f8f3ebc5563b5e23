//! Data source trait and related types

use anyhow::Result;
use hwsens_types::FieldMetadata;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Metadata about a data source
#[derive(Debug, Clone)]
pub struct SourceMetadata {
    /// Unique identifier for this source type
    pub id: String,
    /// Human-readable name
    pub name: String,
    pub description: String,
    /// Keys present in the values map after a successful update
    pub available_keys: Vec<String>,
    /// Recommended update interval
    pub default_interval: Duration,
}

/// Something that turns polled telemetry into named values for consumers
/// (panels, exporters, the CLI).
pub trait DataSource: Send + Sync {
    fn metadata(&self) -> &SourceMetadata;

    /// Describe the fields this source publishes
    fn fields(&self) -> Vec<FieldMetadata>;

    /// Refresh internal state from the underlying telemetry
    fn update(&mut self) -> Result<()>;

    /// Current values keyed by field id
    fn get_values(&self) -> HashMap<String, Value>;

    /// Borrow the internal values map, when the source keeps one
    fn values_ref(&self) -> Option<&HashMap<String, Value>> {
        None
    }

    fn get_value(&self, key: &str) -> Option<Value> {
        match self.values_ref() {
            Some(values) => values.get(key).cloned(),
            None => self.get_values().get(key).cloned(),
        }
    }

    /// Whether the source can produce data on this system right now
    fn is_available(&self) -> bool {
        true
    }

    /// Apply source-specific settings, usually a serialized config under a
    /// well-known key
    fn configure(&mut self, _config: &HashMap<String, Value>) -> Result<()> {
        Ok(())
    }
}

/// Type-erased data source for dynamic dispatch
pub type BoxedDataSource = Box<dyn DataSource>;
