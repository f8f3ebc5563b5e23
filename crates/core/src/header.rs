//! Segment header parsing and validation

use crate::constants::{self, header as field, HEADER_SIZE, SIGNATURE_ACTIVE};
use crate::error::LayoutError;
use crate::region::ByteRegion;
use hwsens_types::{Section, SectionLayout, SegmentHeader};

/// Result of looking at the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStatus {
    Active(SegmentHeader),
    /// Dead marker or an unrecognised signature; the rest is not inspected
    Inactive { signature: [u8; 4] },
}

fn truncated(len: usize) -> LayoutError {
    LayoutError::HeaderTruncated {
        len,
        required: HEADER_SIZE,
    }
}

/// Read the 4-byte signature
pub fn read_signature(region: &ByteRegion<'_>) -> Result<[u8; 4], LayoutError> {
    region
        .read_bytes4(field::SIGNATURE as u64)
        .map_err(|_| truncated(region.len()))
}

/// Read version, poll time and geometry without validating them.
///
/// This is what the snapshot reader does while holding the mutex to learn
/// which byte ranges to copy; validation happens after release.
pub fn read_fields(region: &ByteRegion<'_>) -> Result<SegmentHeader, LayoutError> {
    if region.len() < HEADER_SIZE {
        return Err(truncated(region.len()));
    }
    let u32_at = |offset: usize| region.read_u32(offset as u64).map_err(|_| truncated(region.len()));

    Ok(SegmentHeader {
        version: u32_at(field::VERSION)?,
        revision: u32_at(field::REVISION)?,
        poll_time: region
            .read_i64(field::POLL_TIME as u64)
            .map_err(|_| truncated(region.len()))?,
        sensors: SectionLayout::new(
            u32_at(field::SENSOR_OFFSET)?,
            u32_at(field::SENSOR_STRIDE)?,
            u32_at(field::SENSOR_COUNT)?,
        ),
        readings: SectionLayout::new(
            u32_at(field::READING_OFFSET)?,
            u32_at(field::READING_STRIDE)?,
            u32_at(field::READING_COUNT)?,
        ),
    })
}

fn check_section(
    section: Section,
    layout: &SectionLayout,
    min_stride: usize,
    total_len: u64,
) -> Result<(), LayoutError> {
    if !layout.is_empty() && (layout.stride as usize) < min_stride {
        return Err(LayoutError::StrideTooSmall {
            section,
            stride: layout.stride,
            min: min_stride,
        });
    }
    if layout.end() > total_len {
        return Err(LayoutError::SectionOutOfBounds {
            section,
            end: layout.end(),
            size: total_len,
        });
    }
    Ok(())
}

/// Check both sections against the length of the region they live in
pub fn check_geometry(header: &SegmentHeader, total_len: u64) -> Result<(), LayoutError> {
    for (section, min_stride) in [
        (Section::Sensors, constants::SENSOR_ELEMENT_SIZE),
        (Section::Readings, constants::READING_ELEMENT_SIZE),
    ] {
        check_section(section, header.layout(section), min_stride, total_len)?;
    }
    Ok(())
}

/// Parse and validate the header at the start of `region`.
///
/// `total_len` is the length of the region the sections must fit in, which
/// is the mapped length of the live segment (the private copy may be
/// shorter when the header lies).
pub fn parse_header(region: &ByteRegion<'_>, total_len: u64) -> Result<HeaderStatus, LayoutError> {
    let signature = read_signature(region)?;
    if signature != SIGNATURE_ACTIVE {
        return Ok(HeaderStatus::Inactive { signature });
    }

    let header = read_fields(region)?;
    check_geometry(&header, total_len)?;

    log::debug!(
        "Segment v{}.{} poll_time={} sensors={:?} readings={:?}",
        header.version,
        header.revision,
        header.poll_time,
        header.sensors,
        header.readings
    );
    Ok(HeaderStatus::Active(header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::SegmentImageBuilder;

    fn header_bytes(
        signature: [u8; 4],
        sensors: (u32, u32, u32),
        readings: (u32, u32, u32),
    ) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.extend_from_slice(&signature);
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&1_700_000_000i64.to_le_bytes());
        for v in [sensors.0, sensors.1, sensors.2, readings.0, readings.1, readings.2] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_parse_valid_header() {
        let image = SegmentImageBuilder::new().poll_time(42).build();
        let region = ByteRegion::new(&image);
        match parse_header(&region, image.len() as u64).unwrap() {
            HeaderStatus::Active(header) => {
                assert_eq!(header.poll_time, 42);
                assert_eq!(header.sensors.offset as usize, HEADER_SIZE);
                assert_eq!(header.sensors.count, 0);
            }
            other => panic!("expected active header, got {:?}", other),
        }
    }

    #[test]
    fn test_dead_signature_ignores_geometry() {
        // Geometry that would be rejected on an active segment
        let bytes = header_bytes(*b"DAED", (u32::MAX, 1, u32::MAX), (0, 0, 7));
        let region = ByteRegion::new(&bytes);
        assert_eq!(
            parse_header(&region, bytes.len() as u64).unwrap(),
            HeaderStatus::Inactive { signature: *b"DAED" }
        );
    }

    #[test]
    fn test_unknown_signature_is_inactive() {
        let bytes = header_bytes(*b"ABCD", (44, 264, 0), (44, 316, 0));
        let region = ByteRegion::new(&bytes);
        assert!(matches!(
            parse_header(&region, bytes.len() as u64).unwrap(),
            HeaderStatus::Inactive { .. }
        ));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = header_bytes(SIGNATURE_ACTIVE, (44, 264, 0), (44, 316, 0));
        let region = ByteRegion::new(&bytes[..30]);
        assert_eq!(
            parse_header(&region, 30).unwrap_err(),
            LayoutError::HeaderTruncated {
                len: 30,
                required: HEADER_SIZE
            }
        );
        assert!(read_signature(&ByteRegion::new(&bytes[..3])).is_err());
    }

    #[test]
    fn test_section_past_region_is_corrupt() {
        let bytes = header_bytes(SIGNATURE_ACTIVE, (44, 264, 2), (572, 316, 1));
        let region = ByteRegion::new(&bytes);
        // Needs 572 + 316 = 888 bytes
        assert!(parse_header(&region, 888).is_ok());
        assert_eq!(
            parse_header(&region, 887).unwrap_err(),
            LayoutError::SectionOutOfBounds {
                section: Section::Readings,
                end: 888,
                size: 887
            }
        );
    }

    #[test]
    fn test_huge_geometry_does_not_overflow() {
        let bytes = header_bytes(SIGNATURE_ACTIVE, (u32::MAX, u32::MAX, u32::MAX), (44, 316, 0));
        let region = ByteRegion::new(&bytes);
        assert!(matches!(
            parse_header(&region, 1 << 20).unwrap_err(),
            LayoutError::SectionOutOfBounds {
                section: Section::Sensors,
                ..
            }
        ));
    }

    #[test]
    fn test_stride_below_record_size() {
        let bytes = header_bytes(SIGNATURE_ACTIVE, (44, 200, 1), (244, 316, 0));
        let region = ByteRegion::new(&bytes);
        assert_eq!(
            parse_header(&region, 4096).unwrap_err(),
            LayoutError::StrideTooSmall {
                section: Section::Sensors,
                stride: 200,
                min: 264
            }
        );

        let bytes = header_bytes(SIGNATURE_ACTIVE, (44, 264, 1), (308, 300, 2));
        assert_eq!(
            parse_header(&ByteRegion::new(&bytes), 4096).unwrap_err(),
            LayoutError::StrideTooSmall {
                section: Section::Readings,
                stride: 300,
                min: 316
            }
        );

        // An empty section may carry any stride
        let bytes = header_bytes(SIGNATURE_ACTIVE, (44, 0, 0), (44, 0, 0));
        assert!(parse_header(&ByteRegion::new(&bytes), 44).is_ok());
    }

    #[test]
    fn test_valid_headers_fit_their_region() {
        for (count_s, count_r, extra) in [(0u32, 0u32, 0u32), (1, 3, 0), (4, 9, 16), (2, 0, 100)] {
            let stride_s = 264 + extra;
            let stride_r = 316 + extra;
            let reading_offset = 44 + count_s * stride_s;
            let total = u64::from(reading_offset + count_r * stride_r);
            let bytes = header_bytes(
                SIGNATURE_ACTIVE,
                (44, stride_s, count_s),
                (reading_offset, stride_r, count_r),
            );
            if let HeaderStatus::Active(h) = parse_header(&ByteRegion::new(&bytes), total).unwrap() {
                assert!(h.sensors.end() <= total);
                assert!(h.readings.end() <= total);
            } else {
                panic!("expected active header");
            }
        }
    }
}
