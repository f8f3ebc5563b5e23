//! Synthetic segment images
//!
//! Builds the byte layout the producer publishes, for the in-memory
//! capability, dump fixtures and benchmarks. Strides may be widened to mimic a
//! newer producer that appends fields to its records.

use crate::constants::{
    READING_ELEMENT_SIZE, SENSOR_ELEMENT_SIZE, SIGNATURE_ACTIVE, STRING_LEN, UNIT_STRING_LEN,
    HEADER_SIZE,
};
use crate::text::{decode_fixed, encode_fixed};
use hwsens_types::{ReadingRecord, ReadingType, SensorRecord};

/// A sensor element to encode
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSpec {
    pub sensor_id: u32,
    pub instance: u32,
    pub name_orig: String,
    pub name_user: String,
}

impl SensorSpec {
    pub fn new(sensor_id: u32, instance: u32, name: &str) -> Self {
        Self {
            sensor_id,
            instance,
            name_orig: name.to_string(),
            name_user: String::new(),
        }
    }

    pub fn user_name(mut self, name: &str) -> Self {
        self.name_user = name.to_string();
        self
    }

    /// The record a decoder produces for this element
    pub fn to_record(&self) -> SensorRecord {
        SensorRecord {
            sensor_id: self.sensor_id,
            instance: self.instance,
            name_orig: decode_fixed(&encode_fixed(&self.name_orig, STRING_LEN)).text,
            name_user: decode_fixed(&encode_fixed(&self.name_user, STRING_LEN)).text,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.sensor_id.to_le_bytes());
        out.extend_from_slice(&self.instance.to_le_bytes());
        out.extend_from_slice(&encode_fixed(&self.name_orig, STRING_LEN));
        out.extend_from_slice(&encode_fixed(&self.name_user, STRING_LEN));
    }
}

/// A reading element to encode
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSpec {
    pub type_tag: u32,
    pub sensor_index: u32,
    pub reading_id: u32,
    pub label_orig: String,
    pub label_user: String,
    pub unit: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl ReadingSpec {
    pub fn new(reading_type: ReadingType, sensor_index: u32, reading_id: u32, label: &str) -> Self {
        Self {
            type_tag: reading_type.tag(),
            sensor_index,
            reading_id,
            label_orig: label.to_string(),
            label_user: String::new(),
            unit: String::new(),
            value: 0.0,
            min: 0.0,
            max: 0.0,
            avg: 0.0,
        }
    }

    /// Override the raw type tag, e.g. with one from a newer producer
    pub fn type_tag(mut self, tag: u32) -> Self {
        self.type_tag = tag;
        self
    }

    pub fn user_label(mut self, label: &str) -> Self {
        self.label_user = label.to_string();
        self
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn values(mut self, value: f64, min: f64, max: f64, avg: f64) -> Self {
        self.value = value;
        self.min = min;
        self.max = max;
        self.avg = avg;
        self
    }

    /// The record a decoder produces for this element
    pub fn to_record(&self) -> ReadingRecord {
        ReadingRecord {
            reading_type: ReadingType::from_tag(self.type_tag).unwrap_or(ReadingType::Other),
            type_tag: self.type_tag,
            sensor_index: self.sensor_index,
            reading_id: self.reading_id,
            label_orig: decode_fixed(&encode_fixed(&self.label_orig, STRING_LEN)).text,
            label_user: decode_fixed(&encode_fixed(&self.label_user, STRING_LEN)).text,
            unit: decode_fixed(&encode_fixed(&self.unit, UNIT_STRING_LEN)).text,
            value: self.value,
            min: self.min,
            max: self.max,
            avg: self.avg,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.type_tag.to_le_bytes());
        out.extend_from_slice(&self.sensor_index.to_le_bytes());
        out.extend_from_slice(&self.reading_id.to_le_bytes());
        out.extend_from_slice(&encode_fixed(&self.label_orig, STRING_LEN));
        out.extend_from_slice(&encode_fixed(&self.label_user, STRING_LEN));
        out.extend_from_slice(&encode_fixed(&self.unit, UNIT_STRING_LEN));
        for v in [self.value, self.min, self.max, self.avg] {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
}

/// Builder for a complete segment image
#[derive(Debug, Clone)]
pub struct SegmentImageBuilder {
    signature: [u8; 4],
    version: u32,
    revision: u32,
    poll_time: i64,
    sensor_stride: u32,
    reading_stride: u32,
    trailing_fill: u8,
    sensors: Vec<SensorSpec>,
    readings: Vec<ReadingSpec>,
}

impl Default for SegmentImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentImageBuilder {
    pub fn new() -> Self {
        Self {
            signature: SIGNATURE_ACTIVE,
            version: 2,
            revision: 0,
            poll_time: 0,
            sensor_stride: SENSOR_ELEMENT_SIZE as u32,
            reading_stride: READING_ELEMENT_SIZE as u32,
            trailing_fill: 0,
            sensors: Vec::new(),
            readings: Vec::new(),
        }
    }

    pub fn signature(mut self, signature: [u8; 4]) -> Self {
        self.signature = signature;
        self
    }

    pub fn version(mut self, version: u32, revision: u32) -> Self {
        self.version = version;
        self.revision = revision;
        self
    }

    pub fn poll_time(mut self, poll_time: i64) -> Self {
        self.poll_time = poll_time;
        self
    }

    /// Element size of the sensor table. Values below the known record size
    /// are clamped up.
    pub fn sensor_stride(mut self, stride: u32) -> Self {
        self.sensor_stride = stride.max(SENSOR_ELEMENT_SIZE as u32);
        self
    }

    /// Element size of the reading table. Values below the known record size
    /// are clamped up.
    pub fn reading_stride(mut self, stride: u32) -> Self {
        self.reading_stride = stride.max(READING_ELEMENT_SIZE as u32);
        self
    }

    /// Byte used for the unknown tail of widened elements
    pub fn trailing_fill(mut self, fill: u8) -> Self {
        self.trailing_fill = fill;
        self
    }

    pub fn sensor(mut self, sensor: SensorSpec) -> Self {
        self.sensors.push(sensor);
        self
    }

    pub fn reading(mut self, reading: ReadingSpec) -> Self {
        self.readings.push(reading);
        self
    }

    /// Header, then the sensor table, then the reading table, no gaps
    pub fn build(&self) -> Vec<u8> {
        let sensor_offset = HEADER_SIZE as u32;
        let reading_offset = sensor_offset + self.sensor_stride * self.sensors.len() as u32;
        let total = reading_offset as usize + self.reading_stride as usize * self.readings.len();

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.revision.to_le_bytes());
        out.extend_from_slice(&self.poll_time.to_le_bytes());
        for v in [
            sensor_offset,
            self.sensor_stride,
            self.sensors.len() as u32,
            reading_offset,
            self.reading_stride,
            self.readings.len() as u32,
        ] {
            out.extend_from_slice(&v.to_le_bytes());
        }

        for sensor in &self.sensors {
            let start = out.len();
            sensor.encode(&mut out);
            out.resize(start + self.sensor_stride as usize, self.trailing_fill);
        }
        for reading in &self.readings {
            let start = out.len();
            reading.encode(&mut out);
            out.resize(start + self.reading_stride as usize, self.trailing_fill);
        }

        debug_assert_eq!(out.len(), total);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_image_is_header_only() {
        let image = SegmentImageBuilder::new().build();
        assert_eq!(image.len(), HEADER_SIZE);
        assert_eq!(&image[..4], b"HWiS");
    }

    #[test]
    fn test_image_length_follows_strides() {
        let image = SegmentImageBuilder::new()
            .sensor_stride(300)
            .reading_stride(10)
            .sensor(SensorSpec::new(1, 0, "A"))
            .reading(ReadingSpec::new(ReadingType::Fan, 0, 1, "Fan"))
            .reading(ReadingSpec::new(ReadingType::Fan, 0, 2, "Fan"))
            .build();
        assert_eq!(image.len(), HEADER_SIZE + 300 + 2 * READING_ELEMENT_SIZE);
    }
}
