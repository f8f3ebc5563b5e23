//! hwsens-types: Shared data types for the hwsens shared memory reader.
//!
//! Plain data (records, header geometry, snapshots, diagnostics, source
//! configs) shared by every hwsens crate. No decoding logic and no OS
//! dependencies live here.

pub mod field;
pub mod reading;
pub mod segment;
pub mod sensor;
pub mod snapshot;
pub mod source_configs;

// Re-export commonly used types at the crate root for convenience
pub use field::{FieldMetadata, FieldPurpose, FieldType};
pub use reading::{ReadingRecord, ReadingType};
pub use segment::{Section, SectionLayout, SegmentHeader};
pub use sensor::{SensorKey, SensorRecord};
pub use snapshot::{Diagnostic, SegmentState, Snapshot, TextField};
pub use source_configs::HwinfoSourceConfig;
