//! Sensor records (motherboard, CPU package, GPU, drive, ...)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a sensor. The producer may publish several instances of the
/// same sensor id, so the id alone is not unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SensorKey {
    pub id: u32,
    pub instance: u32,
}

impl SensorKey {
    pub fn new(id: u32, instance: u32) -> Self {
        Self { id, instance }
    }

    /// Decimal id used by existing consumers (`id * 100 + instance`).
    pub fn legacy_id(&self) -> String {
        (u64::from(self.id) * 100 + u64::from(self.instance)).to_string()
    }
}

impl fmt::Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}/{}", self.id, self.instance)
    }
}

/// One decoded element of the sensor table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Sensor id assigned by the producer
    pub sensor_id: u32,
    /// Instance of the sensor (together with `sensor_id` forms the identity)
    pub instance: u32,
    /// Original sensor name
    pub name_orig: String,
    /// Name displayed by the producer, possibly renamed by the user
    pub name_user: String,
}

impl SensorRecord {
    pub fn key(&self) -> SensorKey {
        SensorKey::new(self.sensor_id, self.instance)
    }

    pub fn legacy_id(&self) -> String {
        self.key().legacy_id()
    }

    /// User name, or the original name when the user name is empty
    pub fn display_name(&self) -> &str {
        if self.name_user.is_empty() {
            &self.name_orig
        } else {
            &self.name_user
        }
    }
}
