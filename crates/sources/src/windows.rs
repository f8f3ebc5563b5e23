//! Live segment through the Win32 named file mapping and named mutex
//!
//! The Win32 mutex is owned by the thread that acquired it, so acquire and
//! release must happen on the same thread. [`SnapshotReader`] does both inside
//! one call.
//!
//! [`SnapshotReader`]: hwsens_core::SnapshotReader

use hwsens_core::capability::wait_deadline;
use hwsens_core::constants::{
    CANCEL_POLL_INTERVAL, MAX_MUTEX_WAIT, SEGMENT_MAP_NAME, SEGMENT_MUTEX_NAME,
};
use hwsens_core::{Acquire, CancelFlag, SegmentMapping, SegmentMutex, SegmentProvider, SnapshotError};
use std::ffi::c_void;
use std::mem;
use std::time::{Duration, Instant};
use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, HANDLE, WAIT_ABANDONED,
    WAIT_OBJECT_0, WAIT_TIMEOUT,
};
use windows_sys::Win32::System::Memory::{
    MapViewOfFile, OpenFileMappingW, UnmapViewOfFile, VirtualQuery, FILE_MAP_READ,
    MEMORY_BASIC_INFORMATION, MEMORY_MAPPED_VIEW_ADDRESS,
};
use windows_sys::Win32::System::Threading::{OpenMutexW, ReleaseMutex, WaitForSingleObject};

/// Access right needed to wait on a mutex
const SYNCHRONIZE: u32 = 0x0010_0000;

fn wide(name: &str) -> Vec<u16> {
    name.encode_utf16().chain(std::iter::once(0)).collect()
}

fn last_error(call: &str) -> String {
    // SAFETY: no preconditions
    let code = unsafe { GetLastError() };
    match code {
        ERROR_FILE_NOT_FOUND => format!("{}: not found (is the producer running with shared memory enabled?)", call),
        ERROR_ACCESS_DENIED => format!("{}: access denied", call),
        other => format!("{}: error code {}", call, other),
    }
}

/// Opens the producer's well-known mapping and mutex
#[derive(Debug, Default)]
pub struct WindowsSegmentProvider;

impl WindowsSegmentProvider {
    pub fn new() -> Self {
        Self
    }
}

struct WindowsMapping {
    handle: HANDLE,
    view: MEMORY_MAPPED_VIEW_ADDRESS,
    len: usize,
}

// SAFETY: the view is a read-only mapping owned by this value; nothing else
// in the process frees it
unsafe impl Send for WindowsMapping {}

impl SegmentMapping for WindowsMapping {
    fn bytes(&self) -> &[u8] {
        // SAFETY: `view` points at `len` readable bytes until drop
        unsafe { std::slice::from_raw_parts(self.view.Value as *const u8, self.len) }
    }
}

impl Drop for WindowsMapping {
    fn drop(&mut self) {
        // SAFETY: both were obtained in open_mapping and are released once
        unsafe {
            UnmapViewOfFile(self.view);
            CloseHandle(self.handle);
        }
    }
}

struct WindowsMutex {
    handle: HANDLE,
}

impl WindowsMutex {
    fn wait(&self, timeout: Duration) -> Result<bool, SnapshotError> {
        let millis = timeout.min(MAX_MUTEX_WAIT).as_millis() as u32;
        // SAFETY: `handle` is a valid mutex handle opened with SYNCHRONIZE
        match unsafe { WaitForSingleObject(self.handle, millis) } {
            WAIT_OBJECT_0 => Ok(true),
            WAIT_ABANDONED => {
                log::warn!("Segment mutex was abandoned by its previous owner");
                Ok(true)
            }
            WAIT_TIMEOUT => Ok(false),
            _ => Err(SnapshotError::unavailable(
                SEGMENT_MUTEX_NAME,
                last_error("WaitForSingleObject"),
            )),
        }
    }
}

impl SegmentMutex for WindowsMutex {
    fn acquire(
        &self,
        timeout: Duration,
        cancel: Option<&CancelFlag>,
    ) -> Result<Acquire, SnapshotError> {
        let Some(cancel) = cancel else {
            return Ok(if self.wait(timeout)? {
                Acquire::Acquired
            } else {
                Acquire::TimedOut
            });
        };

        // Wait in short slices so a cancel request is honoured promptly
        let deadline = wait_deadline(timeout);
        loop {
            if cancel.is_cancelled() {
                return Ok(Acquire::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(Acquire::TimedOut);
            }
            if self.wait((deadline - now).min(CANCEL_POLL_INTERVAL))? {
                return Ok(Acquire::Acquired);
            }
        }
    }

    fn release(&self) {
        // SAFETY: called only after a successful acquire on this thread
        if unsafe { ReleaseMutex(self.handle) } == 0 {
            log::error!("{}", last_error("ReleaseMutex"));
        }
    }
}

impl Drop for WindowsMutex {
    fn drop(&mut self) {
        // SAFETY: handle obtained in open_mutex, closed once
        unsafe {
            CloseHandle(self.handle);
        }
    }
}

impl SegmentProvider for WindowsSegmentProvider {
    fn open_mapping(&self) -> Result<Box<dyn SegmentMapping + '_>, SnapshotError> {
        let name = wide(SEGMENT_MAP_NAME);

        // SAFETY: `name` is a NUL terminated UTF-16 string
        let handle = unsafe { OpenFileMappingW(FILE_MAP_READ, 0, name.as_ptr()) };
        if handle == 0 {
            return Err(SnapshotError::unavailable(
                SEGMENT_MAP_NAME,
                last_error("OpenFileMapping"),
            ));
        }

        // SAFETY: valid mapping handle; mapping the whole object read-only
        let view = unsafe { MapViewOfFile(handle, FILE_MAP_READ, 0, 0, 0) };
        if view.Value.is_null() {
            let reason = last_error("MapViewOfFile");
            // SAFETY: handle from above, not used afterwards
            unsafe { CloseHandle(handle) };
            return Err(SnapshotError::unavailable(SEGMENT_MAP_NAME, reason));
        }

        // The view length is not returned by MapViewOfFile; ask the VM manager
        // SAFETY: MEMORY_BASIC_INFORMATION is plain data, zero is a valid value
        let mut info: MEMORY_BASIC_INFORMATION = unsafe { mem::zeroed() };
        // SAFETY: `view` is a live mapping and `info` is sized correctly
        let written = unsafe {
            VirtualQuery(
                view.Value as *const c_void,
                &mut info,
                mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };
        let len = if written == 0 { 0 } else { info.RegionSize };
        log::debug!("Mapped {} ({} bytes)", SEGMENT_MAP_NAME, len);

        Ok(Box::new(WindowsMapping { handle, view, len }))
    }

    fn open_mutex(&self) -> Result<Box<dyn SegmentMutex + '_>, SnapshotError> {
        let name = wide(SEGMENT_MUTEX_NAME);

        // SAFETY: `name` is a NUL terminated UTF-16 string
        let handle = unsafe { OpenMutexW(SYNCHRONIZE, 0, name.as_ptr()) };
        if handle == 0 {
            return Err(SnapshotError::unavailable(
                SEGMENT_MUTEX_NAME,
                last_error("OpenMutex"),
            ));
        }
        Ok(Box::new(WindowsMutex { handle }))
    }

    fn describe(&self) -> String {
        SEGMENT_MAP_NAME.to_string()
    }
}
