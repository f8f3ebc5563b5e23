//! Resolves reading back-references into per-sensor groups

use hwsens_types::{Diagnostic, ReadingRecord};

/// Reading positions grouped by owning sensor position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    pub groups: Vec<Vec<usize>>,
    pub orphans: Vec<usize>,
}

/// Group readings by their sensor index.
///
/// A reading whose index does not name a decoded sensor is kept as an orphan
/// and recorded; it is never dropped.
pub fn link(
    sensor_count: usize,
    readings: &[ReadingRecord],
    diagnostics: &mut Vec<Diagnostic>,
) -> Links {
    let mut links = Links {
        groups: vec![Vec::new(); sensor_count],
        orphans: Vec::new(),
    };

    for (position, reading) in readings.iter().enumerate() {
        match links.groups.get_mut(reading.sensor_index as usize) {
            Some(group) => group.push(position),
            None => {
                links.orphans.push(position);
                diagnostics.push(Diagnostic::OrphanedReading {
                    reading: position,
                    sensor_index: reading.sensor_index,
                });
            }
        }
    }

    links
}
