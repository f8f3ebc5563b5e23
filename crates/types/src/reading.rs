//! Reading records (one telemetry value with min/max/avg)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of value a reading carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReadingType {
    None,
    /// Degrees Celsius
    Temperature,
    Voltage,
    /// RPM
    Fan,
    /// Amps
    Current,
    /// Watts
    Power,
    /// MHz
    Clock,
    /// Percent, MB, ...
    Usage,
    #[default]
    Other,
}

impl ReadingType {
    /// Map the producer's 4-byte tag. Returns `None` for tags this version
    /// does not know about.
    pub fn from_tag(tag: u32) -> Option<Self> {
        Some(match tag {
            0 => ReadingType::None,
            1 => ReadingType::Temperature,
            2 => ReadingType::Voltage,
            3 => ReadingType::Fan,
            4 => ReadingType::Current,
            5 => ReadingType::Power,
            6 => ReadingType::Clock,
            7 => ReadingType::Usage,
            8 => ReadingType::Other,
            _ => return None,
        })
    }

    pub fn tag(&self) -> u32 {
        match self {
            ReadingType::None => 0,
            ReadingType::Temperature => 1,
            ReadingType::Voltage => 2,
            ReadingType::Fan => 3,
            ReadingType::Current => 4,
            ReadingType::Power => 5,
            ReadingType::Clock => 6,
            ReadingType::Usage => 7,
            ReadingType::Other => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingType::None => "None",
            ReadingType::Temperature => "Temp",
            ReadingType::Voltage => "Volt",
            ReadingType::Fan => "Fan",
            ReadingType::Current => "Current",
            ReadingType::Power => "Power",
            ReadingType::Clock => "Clock",
            ReadingType::Usage => "Usage",
            ReadingType::Other => "Other",
        }
    }
}

impl fmt::Display for ReadingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded element of the reading table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub reading_type: ReadingType,
    /// Tag as published, kept so unknown tags stay visible after degrading to `Other`
    pub type_tag: u32,
    /// Position of the owning sensor in the sensor table. Not validated.
    pub sensor_index: u32,
    /// Unique within the owning sensor
    pub reading_id: u32,
    /// Original label (e.g. "Chassis2 Fan")
    pub label_orig: String,
    /// Label displayed by the producer, possibly renamed by the user
    pub label_user: String,
    /// e.g. "RPM"
    pub unit: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl ReadingRecord {
    /// User label, or the original label when the user label is empty
    pub fn display_label(&self) -> &str {
        if self.label_user.is_empty() {
            &self.label_orig
        } else {
            &self.label_user
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_mapping_is_reversible_for_known_tags() {
        for tag in 0..=8 {
            let ty = ReadingType::from_tag(tag).unwrap();
            assert_eq!(ty.tag(), tag);
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(ReadingType::from_tag(9), None);
        assert_eq!(ReadingType::from_tag(u32::MAX), None);
    }

    #[test]
    fn test_reading_type_serialization() {
        let json = serde_json::to_string(&ReadingType::Temperature).unwrap();
        assert_eq!(json, "\"Temperature\"");
        assert_eq!(ReadingType::Clock.to_string(), "Clock");
    }
}
