//! Sensor table decoder

use crate::constants::{sensor as field, SENSOR_ELEMENT_SIZE, STRING_LEN};
use crate::error::LayoutError;
use crate::region::ByteRegion;
use crate::table::{element_err, elements, TextReader};
use hwsens_types::{Diagnostic, Section, SectionLayout, SensorRecord, TextField};

/// Decode every sensor element described by `layout`.
///
/// The position of a record in the returned vector is the index readings use
/// to refer to it.
pub fn decode_sensors(
    region: &ByteRegion<'_>,
    layout: &SectionLayout,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<SensorRecord>, LayoutError> {
    let mut sensors = Vec::with_capacity(layout.count as usize);

    for element in elements(*region, Section::Sensors, *layout, SENSOR_ELEMENT_SIZE)? {
        let (index, element) = element?;
        let err = element_err(Section::Sensors, index);

        let mut text = TextReader {
            element,
            section: Section::Sensors,
            index,
            diagnostics: &mut *diagnostics,
        };
        let name_orig = text.read(field::NAME_ORIG, STRING_LEN, TextField::SensorNameOrig)?;
        let name_user = text.read(field::NAME_USER, STRING_LEN, TextField::SensorNameUser)?;

        sensors.push(SensorRecord {
            sensor_id: element.read_u32(field::ID as u64).map_err(&err)?,
            instance: element.read_u32(field::INSTANCE as u64).map_err(&err)?,
            name_orig,
            name_user,
        });
    }

    Ok(sensors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{SegmentImageBuilder, SensorSpec};

    fn decode(image: &[u8]) -> (Vec<SensorRecord>, Vec<Diagnostic>) {
        let region = ByteRegion::new(image);
        let header = crate::header::read_fields(&region).unwrap();
        let mut diagnostics = Vec::new();
        let sensors = decode_sensors(&region, &header.sensors, &mut diagnostics).unwrap();
        (sensors, diagnostics)
    }

    #[test]
    fn test_decode_sensors_in_order() {
        let image = SegmentImageBuilder::new()
            .sensor(SensorSpec::new(100, 0, "CPU [#0]: Ryzen").user_name("CPU"))
            .sensor(SensorSpec::new(100, 1, "CPU [#1]: Ryzen"))
            .sensor(SensorSpec::new(0xE000_0001, 0, "GPU [#0]"))
            .build();

        let (sensors, diagnostics) = decode(&image);
        assert!(diagnostics.is_empty());
        assert_eq!(sensors.len(), 3);
        assert_eq!(sensors[0].sensor_id, 100);
        assert_eq!(sensors[0].name_user, "CPU");
        assert_eq!(sensors[1].instance, 1);
        assert_eq!(sensors[1].name_user, "");
        assert_eq!(sensors[2].sensor_id, 0xE000_0001);
        assert_eq!(sensors[2].name_orig, "GPU [#0]");
    }

    #[test]
    fn test_wider_stride_ignores_trailing_bytes() {
        let image = SegmentImageBuilder::new()
            .sensor_stride(SENSOR_ELEMENT_SIZE as u32 + 40)
            .trailing_fill(0xAB)
            .sensor(SensorSpec::new(1, 0, "Motherboard"))
            .sensor(SensorSpec::new(2, 0, "Drive"))
            .build();

        let (sensors, _) = decode(&image);
        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors[1].sensor_id, 2);
        assert_eq!(sensors[1].name_orig, "Drive");
    }

    #[test]
    fn test_name_filling_buffer_is_kept() {
        let long = "S".repeat(STRING_LEN);
        let image = SegmentImageBuilder::new()
            .sensor(SensorSpec::new(7, 0, &long))
            .build();

        let (sensors, diagnostics) = decode(&image);
        assert_eq!(sensors[0].name_orig, long);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnterminatedText {
                section: Section::Sensors,
                element: 0,
                field: TextField::SensorNameOrig,
            }]
        );
    }

    #[test]
    fn test_narrow_stride_is_rejected() {
        let image = SegmentImageBuilder::new()
            .sensor(SensorSpec::new(1, 0, "A"))
            .build();
        let region = ByteRegion::new(&image);
        let layout = SectionLayout::new(44, 100, 1);
        let err = decode_sensors(&region, &layout, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, LayoutError::StrideTooSmall { stride: 100, .. }));
    }

    #[test]
    fn test_element_past_region_is_an_error() {
        let image = SegmentImageBuilder::new()
            .sensor(SensorSpec::new(1, 0, "A"))
            .build();
        let region = ByteRegion::new(&image);
        let layout = SectionLayout::new(44, SENSOR_ELEMENT_SIZE as u32, 2);
        let err = decode_sensors(&region, &layout, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, LayoutError::Element { index: 1, .. }));
    }
}
