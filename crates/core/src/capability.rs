//! OS capability used to reach the segment
//!
//! The named mapping and the named mutex are owned by the producer. The
//! reader only needs to open them, look at the mapped bytes and take the lock
//! for a bounded time. Implementations live elsewhere (Windows API, dumps,
//! in-memory fakes).

use crate::constants::MAX_MUTEX_WAIT;
use crate::error::SnapshotError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag that abandons a pending mutex acquisition
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Instant a wait of `timeout` starting now ends at, with `timeout` capped
/// to [`MAX_MUTEX_WAIT`]
pub fn wait_deadline(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout.min(MAX_MUTEX_WAIT)).unwrap_or(now)
}

/// Outcome of a bounded acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Acquired,
    TimedOut,
    /// Abandoned through a [`CancelFlag`]; the mutex is not held
    Cancelled,
}

/// A read-only view of the mapped segment. Unmapped when dropped.
pub trait SegmentMapping: Send {
    fn bytes(&self) -> &[u8];
}

/// The named mutex guarding the segment. Closed when dropped.
pub trait SegmentMutex: Send {
    /// Wait at most `timeout` for the mutex. Implementations must never leave
    /// the mutex held when returning anything but [`Acquire::Acquired`].
    fn acquire(
        &self,
        timeout: Duration,
        cancel: Option<&CancelFlag>,
    ) -> Result<Acquire, SnapshotError>;

    /// Release a mutex previously acquired through this handle
    fn release(&self);
}

/// Opens the named mapping and mutex
pub trait SegmentProvider: Send + Sync {
    fn open_mapping(&self) -> Result<Box<dyn SegmentMapping + '_>, SnapshotError>;

    fn open_mutex(&self) -> Result<Box<dyn SegmentMutex + '_>, SnapshotError>;

    /// Short description for logs
    fn describe(&self) -> String {
        "segment".to_string()
    }
}

impl<T: SegmentProvider + ?Sized> SegmentProvider for Box<T> {
    fn open_mapping(&self) -> Result<Box<dyn SegmentMapping + '_>, SnapshotError> {
        (**self).open_mapping()
    }

    fn open_mutex(&self) -> Result<Box<dyn SegmentMutex + '_>, SnapshotError> {
        (**self).open_mutex()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: SegmentProvider + ?Sized> SegmentProvider for Arc<T> {
    fn open_mapping(&self) -> Result<Box<dyn SegmentMapping + '_>, SnapshotError> {
        (**self).open_mapping()
    }

    fn open_mutex(&self) -> Result<Box<dyn SegmentMutex + '_>, SnapshotError> {
        (**self).open_mutex()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
        clone.reset();
        assert!(!flag.is_cancelled());
    }

    #[test]
    fn test_wait_deadline_caps_huge_timeouts() {
        let start = Instant::now();
        let deadline = wait_deadline(Duration::MAX);
        assert!(deadline >= start);
        assert!(deadline - start <= MAX_MUTEX_WAIT + Duration::from_secs(1));

        let short = wait_deadline(Duration::from_millis(5));
        assert!(short - start <= Duration::from_secs(1));
    }
}
