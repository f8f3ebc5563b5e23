//! Bounds-checked, read-only view over a byte buffer
//!
//! Every structure in the segment is located by offset arithmetic on top of
//! this view. Nothing is ever reinterpreted in place, so a producer that grows
//! its records (or lies about their placement) cannot make us read outside the
//! buffer.

use thiserror::Error;

/// A read went past the end of the region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("read of {len} bytes at offset {offset} exceeds region of {size} bytes")]
pub struct RegionError {
    pub offset: u64,
    pub len: u64,
    pub size: u64,
}

/// Read-only byte region with checked slicing and little-endian scalar reads
#[derive(Debug, Clone, Copy)]
pub struct ByteRegion<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteRegion<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Slice `len` bytes starting at `offset`
    pub fn slice(&self, offset: u64, len: u64) -> Result<&'a [u8], RegionError> {
        let err = RegionError {
            offset,
            len,
            size: self.bytes.len() as u64,
        };
        let end = offset.checked_add(len).ok_or(err)?;
        if end > err.size {
            return Err(err);
        }
        // Both bounds are <= bytes.len(), so they fit in usize
        Ok(&self.bytes[offset as usize..end as usize])
    }

    /// Sub-region of `len` bytes starting at `offset`
    pub fn sub_region(&self, offset: u64, len: u64) -> Result<ByteRegion<'a>, RegionError> {
        self.slice(offset, len).map(ByteRegion::new)
    }

    fn array<const N: usize>(&self, offset: u64) -> Result<[u8; N], RegionError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(offset, N as u64)?);
        Ok(out)
    }

    pub fn read_bytes4(&self, offset: u64) -> Result<[u8; 4], RegionError> {
        self.array(offset)
    }

    pub fn read_u32(&self, offset: u64) -> Result<u32, RegionError> {
        self.array(offset).map(u32::from_le_bytes)
    }

    pub fn read_i64(&self, offset: u64) -> Result<i64, RegionError> {
        self.array(offset).map(i64::from_le_bytes)
    }

    pub fn read_f64(&self, offset: u64) -> Result<f64, RegionError> {
        self.array(offset).map(f64::from_le_bytes)
    }
}
