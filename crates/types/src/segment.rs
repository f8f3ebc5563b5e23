//! Segment header and section geometry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two element arrays that follow the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Sensors,
    Readings,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Sensors => f.write_str("sensor"),
            Section::Readings => f.write_str("reading"),
        }
    }
}

/// Placement of one element array inside the segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectionLayout {
    /// Offset of the first element from the start of the segment
    pub offset: u32,
    /// Size of each element, at least the size of the fields we decode
    pub stride: u32,
    /// Number of elements
    pub count: u32,
}

impl SectionLayout {
    pub fn new(offset: u32, stride: u32, count: u32) -> Self {
        Self {
            offset,
            stride,
            count,
        }
    }

    /// Number of bytes covered by the elements
    pub fn byte_len(&self) -> u64 {
        u64::from(self.stride) * u64::from(self.count)
    }

    /// First byte past the last element. Computed in 64 bits so producer
    /// values can never overflow.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + self.byte_len()
    }

    /// Offset of element `index`
    pub fn element_offset(&self, index: u32) -> u64 {
        u64::from(self.offset) + u64::from(index) * u64::from(self.stride)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Validated header of an active segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentHeader {
    pub version: u32,
    pub revision: u32,
    /// Last time the producer refreshed the data, seconds since the Unix epoch
    pub poll_time: i64,
    pub sensors: SectionLayout,
    pub readings: SectionLayout,
}

impl SegmentHeader {
    pub fn layout(&self, section: Section) -> &SectionLayout {
        match section {
            Section::Sensors => &self.sensors,
            Section::Readings => &self.readings,
        }
    }

    /// Poll time as a UTC timestamp, if representable
    pub fn poll_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.poll_time, 0)
    }

    /// Smallest segment length that holds both sections
    pub fn required_len(&self) -> u64 {
        self.sensors.end().max(self.readings.end())
    }
}
