//! Source configuration types.

pub mod hwinfo;

pub use hwinfo::HwinfoSourceConfig;
