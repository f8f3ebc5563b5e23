//! `SENSOR:READING` selectors given on the command line

use hwsens_types::HwinfoSourceConfig;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("expected SENSOR:READING, got {0:?}")]
    MissingSeparator(String),
    #[error("empty sensor id in {0:?}")]
    EmptySensor(String),
    #[error("invalid reading id {0:?}")]
    InvalidReading(String),
}

/// One reading of one sensor, by legacy sensor id and reading id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingSelector {
    pub sensor_id: String,
    pub reading_id: u32,
}

impl ReadingSelector {
    /// Source config following this reading
    pub fn to_source_config(&self) -> HwinfoSourceConfig {
        HwinfoSourceConfig {
            sensor_id: Some(self.sensor_id.clone()),
            reading_id: Some(self.reading_id),
            ..HwinfoSourceConfig::default()
        }
    }
}

impl FromStr for ReadingSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sensor, reading) = s
            .split_once(':')
            .ok_or_else(|| SelectorError::MissingSeparator(s.to_string()))?;
        let sensor = sensor.trim();
        if sensor.is_empty() {
            return Err(SelectorError::EmptySensor(s.to_string()));
        }
        let reading = reading.trim();
        let reading_id = match reading.strip_prefix("0x") {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => reading.parse(),
        }
        .map_err(|_| SelectorError::InvalidReading(reading.to_string()))?;

        Ok(Self {
            sensor_id: sensor.to_string(),
            reading_id,
        })
    }
}

impl fmt::Display for ReadingSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.sensor_id, self.reading_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector() {
        let sel: ReadingSelector = "10000:7".parse().unwrap();
        assert_eq!(sel.sensor_id, "10000");
        assert_eq!(sel.reading_id, 7);
        assert_eq!(sel.to_string(), "10000:7");

        let hex: ReadingSelector = "10000:0x1000001".parse().unwrap();
        assert_eq!(hex.reading_id, 0x0100_0001);
    }

    #[test]
    fn test_invalid_selectors() {
        assert_eq!(
            "10000".parse::<ReadingSelector>(),
            Err(SelectorError::MissingSeparator("10000".to_string()))
        );
        assert!(matches!(":1".parse::<ReadingSelector>(), Err(SelectorError::EmptySensor(_))));
        assert!(matches!(
            "10000:x".parse::<ReadingSelector>(),
            Err(SelectorError::InvalidReading(_))
        ));
    }

    #[test]
    fn test_source_config() {
        let config = "20001:3".parse::<ReadingSelector>().unwrap().to_source_config();
        assert_eq!(config.sensor_id.as_deref(), Some("20001"));
        assert_eq!(config.reading_id, Some(3));
        assert!(config.use_user_labels);
    }
}
