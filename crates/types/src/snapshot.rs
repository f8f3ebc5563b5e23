//! Decoded, linked view of one poll of the segment

use crate::reading::ReadingRecord;
use crate::segment::{Section, SegmentHeader};
use crate::sensor::{SensorKey, SensorRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-length text fields of the element tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextField {
    SensorNameOrig,
    SensorNameUser,
    LabelOrig,
    LabelUser,
    Unit,
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextField::SensorNameOrig => "sensor name (original)",
            TextField::SensorNameUser => "sensor name (user)",
            TextField::LabelOrig => "label (original)",
            TextField::LabelUser => "label (user)",
            TextField::Unit => "unit",
        };
        f.write_str(name)
    }
}

/// A degraded condition met while decoding. Never aborts a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Type tag outside the known set; the reading was typed `Other`
    UnknownReadingType { reading: usize, tag: u32 },
    /// Sensor index past the end of the sensor table; the reading is an orphan
    OrphanedReading { reading: usize, sensor_index: u32 },
    /// Text buffer with no NUL terminator; the full buffer was used
    UnterminatedText {
        section: Section,
        element: usize,
        field: TextField,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownReadingType { reading, tag } => {
                write!(f, "reading #{} has unknown type tag {}", reading, tag)
            }
            Diagnostic::OrphanedReading {
                reading,
                sensor_index,
            } => write!(
                f,
                "reading #{} references missing sensor #{}",
                reading, sensor_index
            ),
            Diagnostic::UnterminatedText {
                section,
                element,
                field,
            } => write!(f, "{} #{} {} is not NUL terminated", section, element, field),
        }
    }
}

/// Immutable result of one successful poll of an active segment.
///
/// Sensors and readings keep the producer's order. Readings refer to their
/// sensor by position, and the grouping below stores positions only, so the
/// snapshot owns every record exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub header: SegmentHeader,
    pub sensors: Vec<SensorRecord>,
    pub readings: Vec<ReadingRecord>,
    /// `groups[s]` lists the reading positions owned by sensor position `s`
    pub groups: Vec<Vec<usize>>,
    /// Reading positions whose sensor index is out of range
    pub orphans: Vec<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Snapshot {
    pub fn poll_time(&self) -> i64 {
        self.header.poll_time
    }

    /// Readings owned by the sensor at `sensor_pos`
    pub fn readings_for(&self, sensor_pos: usize) -> impl Iterator<Item = &ReadingRecord> + '_ {
        self.groups
            .get(sensor_pos)
            .into_iter()
            .flatten()
            .filter_map(move |&i| self.readings.get(i))
    }

    /// Readings whose owning sensor could not be resolved
    pub fn orphaned_readings(&self) -> impl Iterator<Item = &ReadingRecord> + '_ {
        self.orphans.iter().filter_map(move |&i| self.readings.get(i))
    }

    /// Owning sensor of a reading, if its back-reference resolves
    pub fn sensor_of(&self, reading: &ReadingRecord) -> Option<&SensorRecord> {
        self.sensors.get(reading.sensor_index as usize)
    }

    /// Position of the sensor with the given identity
    pub fn position_of(&self, key: SensorKey) -> Option<usize> {
        self.sensors.iter().position(|s| s.key() == key)
    }

    /// Position of the sensor with the given legacy id
    pub fn position_of_legacy(&self, legacy_id: &str) -> Option<usize> {
        self.sensors.iter().position(|s| s.legacy_id() == legacy_id)
    }

    /// True when the producer has not refreshed since `previous`
    pub fn is_stale_since(&self, previous: &Snapshot) -> bool {
        self.header.poll_time == previous.header.poll_time
    }
}

/// Outcome of a poll that reached the segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SegmentState {
    Active(Snapshot),
    /// The producer marked the segment dead (or it carries a signature we do
    /// not recognise). There is no data, which is not an error.
    Inactive { signature: [u8; 4] },
}

impl SegmentState {
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            SegmentState::Active(snapshot) => Some(snapshot),
            SegmentState::Inactive { .. } => None,
        }
    }

    pub fn into_snapshot(self) -> Option<Snapshot> {
        match self {
            SegmentState::Active(snapshot) => Some(snapshot),
            SegmentState::Inactive { .. } => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SegmentState::Active(_))
    }
}
