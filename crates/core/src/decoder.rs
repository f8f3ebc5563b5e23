//! Decoding a private copy of the segment into a [`SegmentState`]

use crate::error::LayoutError;
use crate::header::{parse_header, HeaderStatus};
use crate::linker::link;
use crate::reading_table::decode_readings;
use crate::region::ByteRegion;
use crate::sensor_table::decode_sensors;
use hwsens_types::{SegmentState, Snapshot};

/// Bytes copied out of the segment while holding its mutex.
///
/// Header, sensor section and reading section sit at their original offsets;
/// anything between them is zero. `mapped_len` is the length of the region
/// the copy was taken from and is what the geometry is validated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment {
    bytes: Vec<u8>,
    mapped_len: u64,
}

impl RawSegment {
    pub fn new(bytes: Vec<u8>, mapped_len: u64) -> Self {
        Self { bytes, mapped_len }
    }

    /// Wrap a previously saved copy
    pub fn from_dump(bytes: Vec<u8>) -> Self {
        let mapped_len = bytes.len() as u64;
        Self { bytes, mapped_len }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn mapped_len(&self) -> u64 {
        self.mapped_len
    }

    /// Validate the header, decode both tables and link them
    pub fn decode(&self) -> Result<SegmentState, LayoutError> {
        decode_segment(&self.bytes, self.mapped_len)
    }
}

/// Decode a segment image. `mapped_len` bounds the section geometry.
pub fn decode_segment(bytes: &[u8], mapped_len: u64) -> Result<SegmentState, LayoutError> {
    let region = ByteRegion::new(bytes);

    let header = match parse_header(&region, mapped_len)? {
        HeaderStatus::Active(header) => header,
        HeaderStatus::Inactive { signature } => {
            log::info!(
                "Segment inactive (signature {:?})",
                String::from_utf8_lossy(&signature)
            );
            return Ok(SegmentState::Inactive { signature });
        }
    };

    let mut diagnostics = Vec::new();
    let sensors = decode_sensors(&region, &header.sensors, &mut diagnostics)?;
    let readings = decode_readings(&region, &header.readings, &mut diagnostics)?;
    let links = link(sensors.len(), &readings, &mut diagnostics);

    if !diagnostics.is_empty() {
        log::warn!(
            "Decoded segment with {} degraded entries ({} orphaned readings)",
            diagnostics.len(),
            links.orphans.len()
        );
        for diagnostic in &diagnostics {
            log::debug!("  {}", diagnostic);
        }
    }

    Ok(SegmentState::Active(Snapshot {
        header,
        sensors,
        readings,
        groups: links.groups,
        orphans: links.orphans,
        diagnostics,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{READING_ELEMENT_SIZE, SENSOR_ELEMENT_SIZE, SIGNATURE_DEAD};
    use crate::image::{ReadingSpec, SegmentImageBuilder, SensorSpec};
    use hwsens_types::{Diagnostic, ReadingType};

    /// One CPU sensor, one linked temperature, one clock pointing at sensor #5
    fn scenario() -> SegmentImageBuilder {
        SegmentImageBuilder::new()
            .poll_time(1_700_000_123)
            .sensor(SensorSpec::new(100, 0, "CPU"))
            .reading(
                ReadingSpec::new(ReadingType::Temperature, 0, 1, "CPU Package")
                    .unit("°C")
                    .values(45.5, 30.0, 80.0, 50.0),
            )
            .reading(
                ReadingSpec::new(ReadingType::Clock, 5, 2, "Core Clock")
                    .unit("MHz")
                    .value(3200.0),
            )
    }

    #[test]
    fn test_scenario_links_and_orphans() {
        let image = scenario().build();
        let state = decode_segment(&image, image.len() as u64).unwrap();
        let snapshot = state.snapshot().unwrap();

        assert_eq!(snapshot.sensors.len(), 1);
        assert_eq!(snapshot.sensors[0].name_orig, "CPU");
        assert_eq!(snapshot.poll_time(), 1_700_000_123);

        let linked: Vec<_> = snapshot.readings_for(0).collect();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].reading_type, ReadingType::Temperature);
        assert_eq!(linked[0].value, 45.5);
        assert_eq!(linked[0].min, 30.0);
        assert_eq!(linked[0].max, 80.0);
        assert_eq!(linked[0].avg, 50.0);
        assert_eq!(snapshot.sensor_of(linked[0]).unwrap().name_orig, "CPU");

        let orphans: Vec<_> = snapshot.orphaned_readings().collect();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].reading_type, ReadingType::Clock);
        assert_eq!(orphans[0].sensor_index, 5);
        assert_eq!(orphans[0].value, 3200.0);
        assert_eq!(
            snapshot.diagnostics,
            vec![Diagnostic::OrphanedReading {
                reading: 1,
                sensor_index: 5
            }]
        );
    }

    #[test]
    fn test_round_trip_with_wide_strides() {
        let sensors = vec![
            SensorSpec::new(0xF000_0100, 0, "System: ASUS").user_name("Board"),
            SensorSpec::new(0xF000_0200, 1, "GPU [#1]: RTX"),
        ];
        let readings = vec![
            ReadingSpec::new(ReadingType::Voltage, 0, 10, "+12V").unit("V").values(12.1, 12.0, 12.2, 12.1),
            ReadingSpec::new(ReadingType::Current, 1, 11, "GPU Current").unit("A").values(10.0, 0.5, 22.0, 8.0),
            ReadingSpec::new(ReadingType::Power, 1, 12, "GPU Power").user_label("Board Power").unit("W").values(200.0, 15.0, 320.0, 180.5),
        ];

        let mut builder = SegmentImageBuilder::new()
            .sensor_stride(SENSOR_ELEMENT_SIZE as u32 + 8)
            .reading_stride(READING_ELEMENT_SIZE as u32 + 24)
            .trailing_fill(0x5A);
        for s in &sensors {
            builder = builder.sensor(s.clone());
        }
        for r in &readings {
            builder = builder.reading(r.clone());
        }
        let image = builder.build();

        let snapshot = decode_segment(&image, image.len() as u64)
            .unwrap()
            .into_snapshot()
            .unwrap();
        assert!(snapshot.diagnostics.is_empty());
        assert_eq!(
            snapshot.sensors,
            sensors.iter().map(SensorSpec::to_record).collect::<Vec<_>>()
        );
        assert_eq!(
            snapshot.readings,
            readings.iter().map(ReadingSpec::to_record).collect::<Vec<_>>()
        );
        assert_eq!(snapshot.groups, vec![vec![0], vec![1, 2]]);
    }

    #[test]
    fn test_inactive_yields_no_records() {
        let image = scenario().signature(SIGNATURE_DEAD).build();
        let state = decode_segment(&image, image.len() as u64).unwrap();
        assert_eq!(state, SegmentState::Inactive { signature: SIGNATURE_DEAD });
    }

    #[test]
    fn test_geometry_past_mapping_is_corrupt() {
        let image = scenario().build();
        let err = decode_segment(&image, image.len() as u64 - 1).unwrap_err();
        assert!(matches!(err, LayoutError::SectionOutOfBounds { .. }));
    }

    #[test]
    fn test_raw_segment_dump() {
        let image = scenario().build();
        let raw = RawSegment::from_dump(image.clone());
        assert_eq!(raw.mapped_len(), image.len() as u64);
        assert!(raw.decode().unwrap().is_active());
        assert_eq!(raw.into_bytes(), image);
    }
}
