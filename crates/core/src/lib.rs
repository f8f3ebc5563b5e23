//! hwsens-core: Decoding and synchronization for the HWiNFO shared memory
//! segment.
//!
//! The producer publishes a packed header followed by a sensor table and a
//! reading table whose element size (stride) it declares itself. This crate
//! copies the segment under the producer's mutex ([`SnapshotReader`]) and
//! decodes the private copy with plain offset arithmetic over a bounds-checked
//! [`ByteRegion`], so records that grow in newer producers still decode.
//!
//! OS access goes through the [`SegmentProvider`] capability.

pub mod capability;
pub mod constants;
mod data_source;
pub mod decoder;
pub mod error;
pub mod header;
pub mod image;
pub mod linker;
pub mod memory;
pub mod reader;
pub mod reading_table;
pub mod region;
pub mod sensor_table;
mod table;
pub mod text;

pub use capability::{Acquire, CancelFlag, SegmentMapping, SegmentMutex, SegmentProvider};
pub use data_source::{BoxedDataSource, DataSource, SourceMetadata};
pub use decoder::{decode_segment, RawSegment};
pub use error::{LayoutError, SnapshotError};
pub use header::HeaderStatus;
pub use memory::{HeldLock, InMemoryProvider};
pub use reader::{ReaderOptions, ReaderState, SnapshotReader};
pub use region::{ByteRegion, RegionError};

// Re-export types used in trait signatures for convenience
pub use hwsens_types::{
    Diagnostic, FieldMetadata, FieldPurpose, FieldType, ReadingRecord, ReadingType, SegmentHeader,
    SegmentState, SensorRecord, Snapshot,
};
