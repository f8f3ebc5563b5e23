//! Layout constants of the HWiNFO shared memory segment
//!
//! All structures are packed (1-byte alignment) and little-endian.

use std::time::Duration;

/// Name of the file mapping object published by the producer
pub const SEGMENT_MAP_NAME: &str = "Global\\HWiNFO_SENS_SM2";

/// Name of the mutex guarding the segment. Hold it as briefly as possible.
pub const SEGMENT_MUTEX_NAME: &str = "Global\\HWiNFO_SM2_MUTEX";

/// Signature of an active segment
pub const SIGNATURE_ACTIVE: [u8; 4] = *b"HWiS";

/// Signature written by the producer on shutdown (`'DEAD'` stored little-endian)
pub const SIGNATURE_DEAD: [u8; 4] = *b"DAED";

/// Length of sensor names and reading labels
pub const STRING_LEN: usize = 128;

/// Length of unit strings
pub const UNIT_STRING_LEN: usize = 16;

/// Header: signature, version, revision, poll time, six geometry fields
pub const HEADER_SIZE: usize = 4 + 4 + 4 + 8 + 6 * 4;

/// Known sensor element: id, instance, two names
pub const SENSOR_ELEMENT_SIZE: usize = 4 + 4 + 2 * STRING_LEN;

/// Known reading element: type, sensor index, id, two labels, unit, four doubles
pub const READING_ELEMENT_SIZE: usize = 3 * 4 + 2 * STRING_LEN + UNIT_STRING_LEN + 4 * 8;

/// Default bound on waiting for the segment mutex
pub const DEFAULT_MUTEX_TIMEOUT: Duration = Duration::from_millis(250);

/// How often the producer refreshes by default
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Slice of a mutex wait between two checks of the cancel flag
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Longest single mutex wait; longer timeouts are capped to it
pub const MAX_MUTEX_WAIT: Duration = Duration::from_millis(u32::MAX as u64 - 1);

/// Header field offsets
pub(crate) mod header {
    pub const SIGNATURE: usize = 0;
    pub const VERSION: usize = 4;
    pub const REVISION: usize = 8;
    pub const POLL_TIME: usize = 12;
    pub const SENSOR_OFFSET: usize = 20;
    pub const SENSOR_STRIDE: usize = 24;
    pub const SENSOR_COUNT: usize = 28;
    pub const READING_OFFSET: usize = 32;
    pub const READING_STRIDE: usize = 36;
    pub const READING_COUNT: usize = 40;
}

/// Sensor element field offsets
pub(crate) mod sensor {
    use super::STRING_LEN;

    pub const ID: usize = 0;
    pub const INSTANCE: usize = 4;
    pub const NAME_ORIG: usize = 8;
    pub const NAME_USER: usize = NAME_ORIG + STRING_LEN;
}

/// Reading element field offsets
pub(crate) mod reading {
    use super::{STRING_LEN, UNIT_STRING_LEN};

    pub const TYPE: usize = 0;
    pub const SENSOR_INDEX: usize = 4;
    pub const ID: usize = 8;
    pub const LABEL_ORIG: usize = 12;
    pub const LABEL_USER: usize = LABEL_ORIG + STRING_LEN;
    pub const UNIT: usize = LABEL_USER + STRING_LEN;
    pub const VALUE: usize = UNIT + UNIT_STRING_LEN;
    pub const MIN: usize = VALUE + 8;
    pub const MAX: usize = MIN + 8;
    pub const AVG: usize = MAX + 8;
}
