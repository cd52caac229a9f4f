//! Error types for SeqArc core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in SeqArc core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] seqarc_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A segment index does not exist in the region.
    #[error("segment {index} not found: region has {count} segments")]
    SegmentNotFound {
        /// The index as supplied by the caller (may be negative).
        index: i64,
        /// Number of segments in the region.
        count: usize,
    },

    /// No region with this name exists.
    #[error("region not found: {name}")]
    RegionNotFound {
        /// Name of the region.
        name: String,
    },

    /// A region with this name already exists.
    #[error("region already exists: {name}")]
    RegionExists {
        /// Name of the region.
        name: String,
    },

    /// The archive holds no live entry under this key.
    #[error("archive entry not found: {key}")]
    EntryNotFound {
        /// The missing key.
        key: String,
    },

    /// The archive already holds a live entry under this key.
    #[error("archive entry already exists: {key}")]
    EntryExists {
        /// The conflicting key.
        key: String,
    },

    /// The archive file does not exist and creation was disabled.
    #[error("archive not found: {}", path.display())]
    ArchiveNotFound {
        /// Path that was opened.
        path: PathBuf,
    },

    /// The archive exists but holds no catalog head record.
    #[error("no catalog stored in archive {}", path.display())]
    CatalogNotFound {
        /// Path of the archive.
        path: PathBuf,
    },

    /// Segment capacity must be a positive number of units.
    #[error("invalid segment capacity: {capacity} (must be at least 1)")]
    InvalidCapacity {
        /// The rejected capacity.
        capacity: usize,
    },

    /// The archive file is damaged.
    #[error("archive corruption: {message}")]
    ArchiveCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// A record checksum did not match its contents.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Checksum stored in the record.
        expected: u32,
        /// Checksum computed over the record.
        actual: u32,
    },

    /// A segment's archived content does not match what the region expects.
    #[error("segment {key} corrupted: {message}")]
    SegmentCorruption {
        /// Backing key of the segment.
        key: String,
        /// Description of the mismatch.
        message: String,
    },

    /// Compressing or decompressing a chunk failed.
    #[error("compression error: {message}")]
    Compression {
        /// Description of the failure.
        message: String,
    },

    /// Invalid archive or head record format.
    #[error("invalid format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Another handle holds the archive's writer lock.
    #[error("archive locked: another handle has exclusive access")]
    ArchiveLocked,

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a region not found error.
    pub fn region_not_found(name: impl Into<String>) -> Self {
        Self::RegionNotFound { name: name.into() }
    }

    /// Creates a region exists error.
    pub fn region_exists(name: impl Into<String>) -> Self {
        Self::RegionExists { name: name.into() }
    }

    /// Creates an entry not found error.
    pub fn entry_not_found(key: impl Into<String>) -> Self {
        Self::EntryNotFound { key: key.into() }
    }

    /// Creates an archive corruption error.
    pub fn archive_corruption(message: impl Into<String>) -> Self {
        Self::ArchiveCorruption {
            message: message.into(),
        }
    }

    /// Creates a segment corruption error.
    pub fn segment_corruption(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SegmentCorruption {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a compression error.
    pub fn compression(message: impl Into<String>) -> Self {
        Self::Compression {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for errors that mean "the named thing does not exist".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SegmentNotFound { .. }
                | Self::RegionNotFound { .. }
                | Self::EntryNotFound { .. }
                | Self::ArchiveNotFound { .. }
                | Self::CatalogNotFound { .. }
        )
    }
}

/// Rejects a zero capacity.
pub(crate) fn validate_capacity(capacity: usize) -> CoreResult<usize> {
    if capacity == 0 {
        return Err(CoreError::InvalidCapacity { capacity });
    }
    Ok(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = CoreError::SegmentNotFound { index: -7, count: 3 };
        assert_eq!(
            err.to_string(),
            "segment -7 not found: region has 3 segments"
        );

        let err = CoreError::region_exists("chr2");
        assert_eq!(err.to_string(), "region already exists: chr2");
    }

    #[test]
    fn not_found_classification() {
        assert!(CoreError::region_not_found("x").is_not_found());
        assert!(CoreError::entry_not_found("x_seg_0").is_not_found());
        assert!(!CoreError::InvalidCapacity { capacity: 0 }.is_not_found());
        assert!(!CoreError::ArchiveLocked.is_not_found());
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            validate_capacity(0),
            Err(CoreError::InvalidCapacity { capacity: 0 })
        ));
        assert_eq!(validate_capacity(1).unwrap(), 1);
    }
}
