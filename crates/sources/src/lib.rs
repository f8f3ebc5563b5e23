//! hwsens-sources: Segment providers, the shared sensor service and data
//! sources built on it.

mod dump;
mod hwinfo;
mod service;
#[cfg(windows)]
mod windows;

pub use dump::{save_dump, DumpProvider};
pub use hwinfo::HwinfoSource;
pub use service::{RefreshOutcome, SensorService, SensorSummary};
#[cfg(windows)]
pub use windows::WindowsSegmentProvider;

use anyhow::Result;
use hwsens_core::SegmentProvider;

/// Provider for the live segment on this platform
#[cfg(windows)]
pub fn live_provider() -> Result<Box<dyn SegmentProvider>> {
    Ok(Box::new(WindowsSegmentProvider::new()))
}

/// Provider for the live segment on this platform
#[cfg(not(windows))]
pub fn live_provider() -> Result<Box<dyn SegmentProvider>> {
    anyhow::bail!("Live HWiNFO shared memory is only available on Windows; use --dump to replay a capture")
}
