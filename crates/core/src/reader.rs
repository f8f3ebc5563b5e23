//! Mutex-guarded snapshot reader
//!
//! One call walks `Idle -> Acquiring -> Holding -> Releasing -> Idle`. The
//! only work done in `Holding` is copying the header and the two sections into
//! a private buffer; validation and decoding run after the mutex is released,
//! so the producer is never blocked on our parsing.

use crate::capability::{Acquire, CancelFlag, SegmentMutex, SegmentProvider};
use crate::constants::{DEFAULT_MUTEX_TIMEOUT, HEADER_SIZE, SIGNATURE_ACTIVE};
use crate::decoder::RawSegment;
use crate::error::{LayoutError, SnapshotError};
use crate::header::{read_fields, read_signature};
use crate::region::ByteRegion;
use hwsens_types::{SectionLayout, SegmentState};
use log::trace;
use std::fmt;
use std::time::Duration;

/// Phase of a snapshot call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Idle,
    Acquiring,
    Holding,
    Releasing,
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Per-reader settings
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Upper bound on waiting for the segment mutex
    pub mutex_timeout: Duration,
    /// Abandons a pending acquisition when set
    pub cancel: Option<CancelFlag>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            mutex_timeout: DEFAULT_MUTEX_TIMEOUT,
            cancel: None,
        }
    }
}

/// Releases the mutex when dropped, whatever path leaves `Holding`
struct LockGuard<'m> {
    mutex: &'m dyn SegmentMutex,
}

impl<'m> LockGuard<'m> {
    fn new(mutex: &'m dyn SegmentMutex) -> Self {
        trace!("Snapshot state: {}", ReaderState::Holding);
        Self { mutex }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        trace!("Snapshot state: {}", ReaderState::Releasing);
        self.mutex.release();
        trace!("Snapshot state: {}", ReaderState::Idle);
    }
}

/// Copy the ranges a decoder needs out of the mapped bytes.
///
/// Runs under the mutex, so it only reads the geometry fields it needs and
/// never validates. Ranges are clamped to the mapping; a header that points
/// past it is reported as corrupt once the copy is decoded.
fn copy_segment(mapped: &[u8]) -> Result<RawSegment, LayoutError> {
    let region = ByteRegion::new(mapped);
    let mapped_len = mapped.len() as u64;

    if read_signature(&region)? != SIGNATURE_ACTIVE {
        let len = mapped.len().min(HEADER_SIZE);
        return Ok(RawSegment::new(mapped[..len].to_vec(), mapped_len));
    }

    let header = read_fields(&region)?;
    let end = header.required_len().min(mapped_len).max(HEADER_SIZE as u64) as usize;
    let mut buf = vec![0u8; end];
    buf[..HEADER_SIZE].copy_from_slice(&mapped[..HEADER_SIZE]);

    let mut copy_section = |layout: &SectionLayout| {
        let start = (layout.offset as usize).min(end);
        let stop = (layout.end().min(end as u64)) as usize;
        if start < stop {
            buf[start..stop].copy_from_slice(&mapped[start..stop]);
        }
    };
    copy_section(&header.sensors);
    copy_section(&header.readings);

    Ok(RawSegment::new(buf, mapped_len))
}

/// Takes consistent snapshots of the segment through a [`SegmentProvider`].
///
/// Holds no mutable state, so one reader can serve concurrent callers; each
/// call performs its own acquire/copy/release cycle.
pub struct SnapshotReader<P> {
    provider: P,
    options: ReaderOptions,
}

impl<P: SegmentProvider> SnapshotReader<P> {
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, ReaderOptions::default())
    }

    pub fn with_options(provider: P, options: ReaderOptions) -> Self {
        Self { provider, options }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Copy the segment under its mutex without decoding it
    pub fn capture(&self) -> Result<RawSegment, SnapshotError> {
        let mapping = self.provider.open_mapping()?;
        let mutex = self.provider.open_mutex()?;

        trace!("Snapshot state: {}", ReaderState::Acquiring);
        let timeout = self.options.mutex_timeout;
        match mutex.acquire(timeout, self.options.cancel.as_ref())? {
            Acquire::Acquired => {}
            Acquire::TimedOut => {
                log::debug!("{} busy for {:?}", self.provider.describe(), timeout);
                trace!("Snapshot state: {}", ReaderState::Idle);
                return Err(SnapshotError::Busy { timeout });
            }
            Acquire::Cancelled => {
                trace!("Snapshot state: {}", ReaderState::Idle);
                return Err(SnapshotError::Cancelled);
            }
        }

        let raw = {
            let _guard = LockGuard::new(&*mutex);
            copy_segment(mapping.bytes())
        };
        Ok(raw?)
    }

    /// Take a snapshot: capture, then decode the private copy
    pub fn read(&self) -> Result<SegmentState, SnapshotError> {
        let raw = self.capture()?;
        Ok(raw.decode()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::SegmentMapping;
    use crate::constants::SIGNATURE_DEAD;
    use crate::image::{ReadingSpec, SegmentImageBuilder, SensorSpec};
    use crate::memory::InMemoryProvider;
    use hwsens_types::{ReadingType, Section};
    use std::sync::Arc;
    use std::thread;

    fn image() -> Vec<u8> {
        SegmentImageBuilder::new()
            .poll_time(77)
            .sensor(SensorSpec::new(100, 0, "CPU"))
            .reading(ReadingSpec::new(ReadingType::Temperature, 0, 1, "Core").values(45.5, 30.0, 80.0, 50.0))
            .build()
    }

    fn reader(provider: InMemoryProvider, timeout_ms: u64) -> SnapshotReader<InMemoryProvider> {
        SnapshotReader::with_options(
            provider,
            ReaderOptions {
                mutex_timeout: Duration::from_millis(timeout_ms),
                cancel: None,
            },
        )
    }

    #[test]
    fn test_read_active_segment() {
        let reader = reader(InMemoryProvider::new(image()), 50);
        let state = reader.read().unwrap();
        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.poll_time(), 77);
        assert_eq!(snapshot.sensors[0].name_orig, "CPU");
        assert_eq!(snapshot.readings[0].value, 45.5);

        let provider = reader.provider();
        assert_eq!(provider.acquisitions(), 1);
        assert_eq!(provider.releases(), 1);
        assert!(!provider.is_locked());
    }

    #[test]
    fn test_busy_when_lock_is_held() {
        let reader = reader(InMemoryProvider::new(image()), 20);
        let held = reader.provider().hold_lock();

        let err = reader.read().unwrap_err();
        assert!(matches!(err, SnapshotError::Busy { timeout } if timeout == Duration::from_millis(20)));
        assert_eq!(reader.provider().acquisitions(), 0);

        drop(held);
        assert!(reader.read().unwrap().is_active());
    }

    #[test]
    fn test_cancelled_acquire() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let provider = InMemoryProvider::new(image());
        let _held = provider.hold_lock();
        let reader = SnapshotReader::with_options(
            provider,
            ReaderOptions {
                mutex_timeout: Duration::from_secs(5),
                cancel: Some(cancel),
            },
        );
        assert!(matches!(reader.read(), Err(SnapshotError::Cancelled)));
        assert_eq!(reader.provider().acquisitions(), 0);
    }

    #[test]
    fn test_unavailable_segment() {
        let reader = reader(InMemoryProvider::unavailable(), 20);
        assert!(matches!(
            reader.read(),
            Err(SnapshotError::Unavailable { .. })
        ));
        assert_eq!(reader.provider().acquisitions(), 0);
    }

    #[test]
    fn test_mutex_released_after_corrupt_layout() {
        let mut bytes = image();
        // Claim one more reading than the mapping holds
        bytes[40..44].copy_from_slice(&2u32.to_le_bytes());
        let reader = reader(InMemoryProvider::new(bytes), 20);

        let err = reader.read().unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::CorruptLayout(LayoutError::SectionOutOfBounds { .. })
        ));
        assert_eq!(reader.provider().releases(), 1);
        assert!(!reader.provider().is_locked());
    }

    #[test]
    fn test_mutex_released_after_truncated_header() {
        let reader = reader(InMemoryProvider::new(b"HWiS\x02\0\0\0".to_vec()), 20);
        assert!(matches!(
            reader.read(),
            Err(SnapshotError::CorruptLayout(LayoutError::HeaderTruncated { .. }))
        ));
        assert_eq!(reader.provider().acquisitions(), 1);
        assert_eq!(reader.provider().releases(), 1);
    }

    #[test]
    fn test_unbounded_timeout_reads_free_segment() {
        let reader = SnapshotReader::with_options(
            InMemoryProvider::new(image()),
            ReaderOptions {
                mutex_timeout: Duration::MAX,
                cancel: None,
            },
        );
        assert!(reader.read().unwrap().is_active());
        assert_eq!(reader.provider().releases(), 1);
    }

    #[test]
    fn test_mutex_released_after_short_reading_stride() {
        let mut bytes = image();
        // One reading declared with a stride shorter than the known record
        bytes[36..40].copy_from_slice(&200u32.to_le_bytes());
        let reader = reader(InMemoryProvider::new(bytes), 20);

        assert!(matches!(
            reader.read(),
            Err(SnapshotError::CorruptLayout(LayoutError::StrideTooSmall {
                section: Section::Readings,
                stride: 200,
                min: 316,
            }))
        ));
        assert_eq!(reader.provider().acquisitions(), 1);
        assert_eq!(reader.provider().releases(), 1);
        assert!(!reader.provider().is_locked());
    }

    #[test]
    fn test_inactive_segment() {
        let bytes = SegmentImageBuilder::new()
            .signature(SIGNATURE_DEAD)
            .sensor(SensorSpec::new(1, 0, "stale"))
            .build();
        let reader = reader(InMemoryProvider::new(bytes), 20);
        let raw = reader.capture().unwrap();
        assert_eq!(raw.as_bytes().len(), HEADER_SIZE);
        assert_eq!(
            raw.decode().unwrap(),
            SegmentState::Inactive {
                signature: SIGNATURE_DEAD
            }
        );
    }

    #[test]
    fn test_capture_copies_only_described_ranges() {
        let mut bytes = image();
        let tail = bytes.len();
        // Unrelated bytes after the reading section are not part of the copy
        bytes.extend_from_slice(&[0xEE; 32]);
        let reader = reader(InMemoryProvider::new(bytes.clone()), 20);

        let raw = reader.capture().unwrap();
        assert_eq!(raw.as_bytes(), &bytes[..tail]);
        assert_eq!(raw.mapped_len(), bytes.len() as u64);
    }

    #[test]
    fn test_concurrent_readers() {
        let reader = Arc::new(reader(InMemoryProvider::new(image()), 1000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reader = Arc::clone(&reader);
                thread::spawn(move || {
                    for _ in 0..25 {
                        let state = reader.read().unwrap();
                        assert_eq!(state.snapshot().unwrap().readings.len(), 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(reader.provider().acquisitions(), 200);
        assert_eq!(reader.provider().releases(), 200);
    }

    #[test]
    fn test_copy_clamps_to_mapping() {
        struct Fixed(Vec<u8>);
        impl SegmentMapping for Fixed {
            fn bytes(&self) -> &[u8] {
                &self.0
            }
        }

        let mut bytes = image();
        bytes[28..32].copy_from_slice(&50u32.to_le_bytes());
        let mapping = Fixed(bytes);
        let raw = copy_segment(mapping.bytes()).unwrap();
        assert_eq!(raw.as_bytes().len(), mapping.bytes().len());
        assert!(raw.decode().is_err());
    }
}
