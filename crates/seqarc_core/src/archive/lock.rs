//! Advisory writer lock for archive files.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Suffix appended to the archive path to name its lock file.
const LOCK_SUFFIX: &str = ".lock";

/// Returns the lock file path for an archive.
pub(crate) fn lock_path(archive_path: &Path) -> PathBuf {
    let mut name = OsString::from(archive_path.as_os_str());
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}

/// Exclusive lock held for as long as an [`Archive`](super::Archive) is open.
///
/// The lock lives in a sibling `<archive>.lock` file so the archive file
/// itself can be replaced during compaction without dropping the lock.
#[derive(Debug)]
pub(crate) struct ArchiveLock {
    path: PathBuf,
    file: File,
}

impl ArchiveLock {
    /// Takes the lock without blocking.
    ///
    /// Returns [`CoreError::ArchiveLocked`] if another handle holds it.
    pub(crate) fn acquire(archive_path: &Path) -> CoreResult<Self> {
        let path = lock_path(archive_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(CoreError::ArchiveLocked);
        }

        Ok(Self { path, file })
    }

    /// Path of the lock file.
    #[allow(dead_code)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArchiveLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
