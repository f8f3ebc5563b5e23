//! In-process segment and mutex
//!
//! Behaves like the named objects of the live producer: the segment can be
//! published, replaced or withdrawn, and the mutex can be held by another
//! party (see [`InMemoryProvider::hold_lock`]) to exercise timeouts.

use crate::capability::{
    wait_deadline, Acquire, CancelFlag, SegmentMapping, SegmentMutex, SegmentProvider,
};
use crate::constants::CANCEL_POLL_INTERVAL;
use crate::error::SnapshotError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct LockState {
    held: Mutex<bool>,
    released: Condvar,
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
}

impl LockState {
    fn held(&self) -> MutexGuard<'_, bool> {
        // Recover from a poisoned mutex - the flag is still meaningful
        self.held.lock().unwrap_or_else(|poisoned| {
            log::warn!("In-memory segment lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn release(&self) {
        let mut held = self.held();
        *held = false;
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.released.notify_all();
    }
}

/// Segment and mutex held in process memory
pub struct InMemoryProvider {
    segment: Mutex<Option<Arc<Vec<u8>>>>,
    lock: Arc<LockState>,
    mutex_available: AtomicBool,
}

impl InMemoryProvider {
    /// A provider publishing `bytes`
    pub fn new(bytes: Vec<u8>) -> Self {
        let provider = Self::unavailable();
        provider.publish(bytes);
        provider
    }

    /// A provider with no segment published yet
    pub fn unavailable() -> Self {
        Self {
            segment: Mutex::new(None),
            lock: Arc::new(LockState {
                held: Mutex::new(false),
                released: Condvar::new(),
                acquisitions: AtomicUsize::new(0),
                releases: AtomicUsize::new(0),
            }),
            mutex_available: AtomicBool::new(true),
        }
    }

    fn segment(&self) -> MutexGuard<'_, Option<Arc<Vec<u8>>>> {
        self.segment.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the published segment contents
    pub fn publish(&self, bytes: Vec<u8>) {
        *self.segment() = Some(Arc::new(bytes));
    }

    /// Stop publishing; opening the mapping fails afterwards
    pub fn withdraw(&self) {
        *self.segment() = None;
    }

    pub fn set_mutex_available(&self, available: bool) {
        self.mutex_available.store(available, Ordering::SeqCst);
    }

    /// Take the mutex as another party would, blocking until it is free.
    /// Released when the returned handle is dropped.
    pub fn hold_lock(&self) -> HeldLock {
        let mut held = self.lock.held();
        while *held {
            held = self
                .lock
                .released
                .wait(held)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *held = true;
        HeldLock {
            lock: Arc::clone(&self.lock),
        }
    }

    pub fn is_locked(&self) -> bool {
        *self.lock.held()
    }

    /// Successful acquisitions through [`SegmentMutex::acquire`]
    pub fn acquisitions(&self) -> usize {
        self.lock.acquisitions.load(Ordering::SeqCst)
    }

    /// Releases through [`SegmentMutex::release`] (and [`HeldLock`] drops)
    pub fn releases(&self) -> usize {
        self.lock.releases.load(Ordering::SeqCst)
    }
}

/// The mutex held on behalf of another party
pub struct HeldLock {
    lock: Arc<LockState>,
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        self.lock.release();
    }
}

struct InMemoryMapping {
    bytes: Arc<Vec<u8>>,
}

impl SegmentMapping for InMemoryMapping {
    fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

struct InMemoryMutex {
    lock: Arc<LockState>,
}

impl SegmentMutex for InMemoryMutex {
    fn acquire(
        &self,
        timeout: Duration,
        cancel: Option<&CancelFlag>,
    ) -> Result<Acquire, SnapshotError> {
        let deadline = wait_deadline(timeout);
        let mut held = self.lock.held();

        loop {
            if cancel.is_some_and(CancelFlag::is_cancelled) {
                return Ok(Acquire::Cancelled);
            }
            if !*held {
                *held = true;
                self.lock.acquisitions.fetch_add(1, Ordering::SeqCst);
                return Ok(Acquire::Acquired);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(Acquire::TimedOut);
            }
            let wait = (deadline - now).min(CANCEL_POLL_INTERVAL);
            held = match self.lock.released.wait_timeout(held, wait) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    fn release(&self) {
        self.lock.release();
    }
}

impl SegmentProvider for InMemoryProvider {
    fn open_mapping(&self) -> Result<Box<dyn SegmentMapping + '_>, SnapshotError> {
        let bytes = self
            .segment()
            .clone()
            .ok_or_else(|| SnapshotError::unavailable("in-memory segment", "not published"))?;
        Ok(Box::new(InMemoryMapping { bytes }))
    }

    fn open_mutex(&self) -> Result<Box<dyn SegmentMutex + '_>, SnapshotError> {
        if !self.mutex_available.load(Ordering::SeqCst) {
            return Err(SnapshotError::unavailable("in-memory mutex", "not created"));
        }
        Ok(Box::new(InMemoryMutex {
            lock: Arc::clone(&self.lock),
        }))
    }

    fn describe(&self) -> String {
        "in-memory segment".to_string()
    }
}
