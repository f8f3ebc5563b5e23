//! Errors that abort a snapshot
//!
//! Degraded conditions (unknown reading types, orphaned readings, missing
//! terminators) are not errors; they are recorded as
//! [`Diagnostic`](hwsens_types::Diagnostic)s on the snapshot.

use crate::region::RegionError;
use hwsens_types::Section;
use std::time::Duration;
use thiserror::Error;

/// The segment geometry cannot be decoded safely
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("segment of {len} bytes is shorter than the {required} byte header")]
    HeaderTruncated { len: usize, required: usize },

    #[error("{section} section ends at byte {end} but the segment is {size} bytes")]
    SectionOutOfBounds { section: Section, end: u64, size: u64 },

    #[error("{section} stride of {stride} bytes is below the {min} byte record size")]
    StrideTooSmall { section: Section, stride: u32, min: usize },

    #[error("{section} element #{index}: {source}")]
    Element {
        section: Section,
        index: usize,
        #[source]
        source: RegionError,
    },
}

/// Why a snapshot attempt was abandoned
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The named mapping or mutex could not be opened (producer not running,
    /// shared memory support disabled, insufficient rights)
    #[error("{resource} is unavailable: {reason}")]
    Unavailable { resource: String, reason: String },

    /// Another party held the mutex past the timeout. Callers may retry.
    #[error("segment mutex not acquired within {timeout:?}")]
    Busy { timeout: Duration },

    /// A pending acquisition was abandoned through the cancel flag
    #[error("mutex acquisition cancelled")]
    Cancelled,

    #[error("corrupt segment layout: {0}")]
    CorruptLayout(#[from] LayoutError),
}

impl SnapshotError {
    pub fn unavailable(resource: impl Into<String>, reason: impl ToString) -> Self {
        SnapshotError::Unavailable {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    /// True for conditions a polling loop should simply retry later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SnapshotError::Busy { .. } | SnapshotError::Unavailable { .. }
        )
    }
}
