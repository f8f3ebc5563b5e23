//! Striding over an element array

use crate::error::LayoutError;
use crate::region::{ByteRegion, RegionError};
use crate::text::decode_fixed;
use hwsens_types::{Diagnostic, Section, SectionLayout, TextField};

/// Yield the known leading `record_size` bytes of every element.
///
/// Element `i` starts at `offset + i * stride`; bytes between `record_size`
/// and `stride` belong to fields this version does not know and are skipped.
pub(crate) fn elements<'a>(
    region: ByteRegion<'a>,
    section: Section,
    layout: SectionLayout,
    record_size: usize,
) -> Result<impl Iterator<Item = Result<(usize, ByteRegion<'a>), LayoutError>> + 'a, LayoutError> {
    if !layout.is_empty() && (layout.stride as usize) < record_size {
        return Err(LayoutError::StrideTooSmall {
            section,
            stride: layout.stride,
            min: record_size,
        });
    }

    Ok((0..layout.count).map(move |i| {
        let index = i as usize;
        region
            .sub_region(layout.element_offset(i), record_size as u64)
            .map(|element| (index, element))
            .map_err(|source| LayoutError::Element {
                section,
                index,
                source,
            })
    }))
}

/// Decodes the fixed text fields of one element, recording missing terminators
pub(crate) struct TextReader<'a, 'd> {
    pub element: ByteRegion<'a>,
    pub section: Section,
    pub index: usize,
    pub diagnostics: &'d mut Vec<Diagnostic>,
}

impl TextReader<'_, '_> {
    pub fn read(&mut self, offset: usize, len: usize, field: TextField) -> Result<String, LayoutError> {
        let bytes = self
            .element
            .slice(offset as u64, len as u64)
            .map_err(element_err(self.section, self.index))?;
        let decoded = decode_fixed(bytes);
        if !decoded.terminated {
            self.diagnostics.push(Diagnostic::UnterminatedText {
                section: self.section,
                element: self.index,
                field,
            });
        }
        Ok(decoded.text)
    }
}

/// Map a region error inside an element to a layout error
pub(crate) fn element_err(section: Section, index: usize) -> impl Fn(RegionError) -> LayoutError {
    move |source| LayoutError::Element {
        section,
        index,
        source,
    }
}
