//! Reading table decoder

use crate::constants::{reading as field, READING_ELEMENT_SIZE, STRING_LEN, UNIT_STRING_LEN};
use crate::error::LayoutError;
use crate::region::ByteRegion;
use crate::table::{element_err, elements, TextReader};
use hwsens_types::{Diagnostic, ReadingRecord, ReadingType, Section, SectionLayout, TextField};

/// Decode every reading element described by `layout`.
///
/// Unknown type tags degrade to [`ReadingType::Other`]. The owning sensor
/// index is copied as-is; resolving it is the linker's job.
pub fn decode_readings(
    region: &ByteRegion<'_>,
    layout: &SectionLayout,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<ReadingRecord>, LayoutError> {
    let mut readings = Vec::with_capacity(layout.count as usize);

    for element in elements(*region, Section::Readings, *layout, READING_ELEMENT_SIZE)? {
        let (index, element) = element?;
        let err = element_err(Section::Readings, index);

        let type_tag = element.read_u32(field::TYPE as u64).map_err(&err)?;
        let reading_type = ReadingType::from_tag(type_tag).unwrap_or_else(|| {
            diagnostics.push(Diagnostic::UnknownReadingType {
                reading: index,
                tag: type_tag,
            });
            ReadingType::Other
        });

        let mut text = TextReader {
            element,
            section: Section::Readings,
            index,
            diagnostics: &mut *diagnostics,
        };
        let label_orig = text.read(field::LABEL_ORIG, STRING_LEN, TextField::LabelOrig)?;
        let label_user = text.read(field::LABEL_USER, STRING_LEN, TextField::LabelUser)?;
        let unit = text.read(field::UNIT, UNIT_STRING_LEN, TextField::Unit)?;

        readings.push(ReadingRecord {
            reading_type,
            type_tag,
            sensor_index: element.read_u32(field::SENSOR_INDEX as u64).map_err(&err)?,
            reading_id: element.read_u32(field::ID as u64).map_err(&err)?,
            label_orig,
            label_user,
            unit,
            value: element.read_f64(field::VALUE as u64).map_err(&err)?,
            min: element.read_f64(field::MIN as u64).map_err(&err)?,
            max: element.read_f64(field::MAX as u64).map_err(&err)?,
            avg: element.read_f64(field::AVG as u64).map_err(&err)?,
        });
    }

    Ok(readings)
}
