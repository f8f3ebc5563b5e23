//! hwsens: Reader and debugger for the HWiNFO shared memory sensor segment
//!
//! This library ties the workspace crates together:
//! - Configuration management
//! - A tokio poller streaming snapshots over a channel
//! - Text and JSON rendering of snapshots

pub mod config;
pub mod output;
pub mod poller;
pub mod selection;

// Re-export commonly used types
pub use config::AppConfig;
pub use poller::{PollEvent, Poller};
pub use selection::ReadingSelector;
