//! Raw segment dumps
//!
//! A dump is the private copy taken by [`SnapshotReader::capture`], written
//! as-is. Replaying it through [`DumpProvider`] runs the exact decode path of
//! the live segment on any platform.
//!
//! [`SnapshotReader::capture`]: hwsens_core::SnapshotReader::capture

use anyhow::{Context, Result};
use hwsens_core::{
    InMemoryProvider, RawSegment, SegmentMapping, SegmentMutex, SegmentProvider, SnapshotError,
};
use std::path::{Path, PathBuf};

/// Serves a dump file as if it were the live segment
pub struct DumpProvider {
    path: PathBuf,
    inner: InMemoryProvider,
}

impl DumpProvider {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read segment dump: {}", path.display()))?;
        log::info!("Loaded segment dump {} ({} bytes)", path.display(), bytes.len());

        Ok(Self {
            path,
            inner: InMemoryProvider::new(bytes),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SegmentProvider for DumpProvider {
    fn open_mapping(&self) -> Result<Box<dyn SegmentMapping + '_>, SnapshotError> {
        self.inner.open_mapping()
    }

    fn open_mutex(&self) -> Result<Box<dyn SegmentMutex + '_>, SnapshotError> {
        self.inner.open_mutex()
    }

    fn describe(&self) -> String {
        format!("dump {}", self.path.display())
    }
}

/// Write a captured copy to `path`, creating parent directories
pub fn save_dump(raw: &RawSegment, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, raw.as_bytes())
        .with_context(|| format!("Failed to write segment dump: {}", path.display()))?;
    log::info!("Saved segment dump {} ({} bytes)", path.display(), raw.as_bytes().len());
    Ok(())
}
