//! Keyed archive over an append-only storage backend.

use crate::archive::lock::ArchiveLock;
use crate::archive::record::EntryRecord;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use seqarc_storage::{FileBackend, InMemoryBackend, StorageBackend};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Magic bytes at the start of every archive file.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"SQAR";

/// Current archive format version.
pub const ARCHIVE_VERSION: u16 = 1;

/// Size of the archive file header: magic (4) + version (2) + reserved (2).
pub const ARCHIVE_HEADER_SIZE: u64 = 8;

/// Keyed byte store that segments are persisted into.
///
/// Keys are never re-appended while live: callers purge first. Segments and
/// regions take the store as an argument instead of holding a reference to
/// it, so one store can serve every region of a catalog.
pub trait BackingStore {
    /// Returns the bytes stored under `key`.
    ///
    /// # Errors
    ///
    /// [`CoreError::EntryNotFound`] if `key` is not live, or an I/O error.
    fn extract(&self, key: &str) -> CoreResult<Vec<u8>>;

    /// Stores `data` under `key`.
    ///
    /// # Errors
    ///
    /// [`CoreError::EntryExists`] if `key` is already live, or an I/O error.
    fn append(&mut self, key: &str, data: &[u8]) -> CoreResult<()>;

    /// Removes `key`. Purging an absent key does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be recorded.
    fn purge(&mut self, key: &str) -> CoreResult<()>;

    /// Returns whether `key` is live.
    fn contains(&self, key: &str) -> bool;

    /// Returns all live keys in sorted order.
    fn keys(&self) -> Vec<String>;
}

/// Where a live record sits in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EntryLocation {
    offset: u64,
    len: usize,
}

/// Space accounting for an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArchiveStats {
    /// Number of live keys.
    pub live_entries: usize,
    /// Bytes occupied by live records.
    pub live_bytes: u64,
    /// Number of records in the log, live or not.
    pub records: usize,
    /// Number of tombstone records in the log.
    pub tombstones: usize,
    /// Bytes occupied by superseded records and tombstones.
    pub dead_bytes: u64,
    /// Total log size including the header.
    pub total_bytes: u64,
}

/// Result of [`Archive::compact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionStats {
    /// Records in the log before compaction.
    pub input_records: usize,
    /// Records written to the compacted log.
    pub output_records: usize,
    /// Log size before compaction.
    pub bytes_before: u64,
    /// Log size after compaction.
    pub bytes_after: u64,
}

impl CompactionStats {
    /// Bytes reclaimed.
    #[must_use]
    pub fn bytes_saved(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// A single archive file: an append-only log of keyed records.
///
/// Every `append` writes a put record, every `purge` writes a tombstone; an
/// in-memory index maps live keys to their newest record and is rebuilt by
/// scanning the log on open. [`compact`](Self::compact) rewrites the log with
/// only the live records.
///
/// ## File Layout
///
/// ```text
/// | "SQAR" (4) | version (2) | reserved (2) | record | record | ... |
/// ```
pub struct Archive {
    backend: Box<dyn StorageBackend>,
    path: Option<PathBuf>,
    index: HashMap<String, EntryLocation>,
    records: usize,
    tombstones: usize,
    dead_bytes: u64,
    _lock: Option<ArchiveLock>,
}

impl Archive {
    /// Opens (or creates) the archive file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ArchiveNotFound`] if the file is missing and
    ///   `config.create_if_missing` is false
    /// - [`CoreError::ArchiveLocked`] if another handle holds the lock
    /// - format, checksum or I/O errors from scanning the log
    pub fn open(path: &Path, config: &Config) -> CoreResult<Self> {
        if !path.exists() && !config.create_if_missing {
            return Err(CoreError::ArchiveNotFound {
                path: path.to_path_buf(),
            });
        }

        let backend = FileBackend::open_with_create_dirs(path)?;
        let lock = if config.lock {
            Some(ArchiveLock::acquire(path)?)
        } else {
            None
        };

        let mut archive = Self::with_backend(Box::new(backend))?;
        archive.path = Some(path.to_path_buf());
        archive._lock = lock;

        info!(
            path = %path.display(),
            entries = archive.index.len(),
            "opened archive"
        );
        Ok(archive)
    }

    /// Creates an archive that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::empty(Box::new(InMemoryBackend::with_data(Self::header_bytes())))
    }

    /// Wraps an arbitrary backend, initializing or validating its header and
    /// rebuilding the key index.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is invalid or the log is corrupted.
    pub fn with_backend(backend: Box<dyn StorageBackend>) -> CoreResult<Self> {
        let mut archive = Self::empty(backend);

        if archive.backend.size()? == 0 {
            archive.write_header()?;
        } else {
            archive.check_header()?;
            archive.rebuild_index()?;
        }

        Ok(archive)
    }

    fn empty(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            path: None,
            index: HashMap::new(),
            records: 0,
            tombstones: 0,
            dead_bytes: 0,
            _lock: None,
        }
    }

    fn header_bytes() -> Vec<u8> {
        let mut header = Vec::with_capacity(ARCHIVE_HEADER_SIZE as usize);
        header.extend_from_slice(&ARCHIVE_MAGIC);
        header.extend_from_slice(&ARCHIVE_VERSION.to_le_bytes());
        header.extend_from_slice(&[0, 0]);
        header
    }

    fn write_header(&mut self) -> CoreResult<()> {
        self.backend.append(&Self::header_bytes())?;
        Ok(())
    }

    fn check_header(&self) -> CoreResult<()> {
        if self.backend.size()? < ARCHIVE_HEADER_SIZE {
            return Err(CoreError::invalid_format("archive header truncated"));
        }

        let header = self.backend.read_at(0, ARCHIVE_HEADER_SIZE as usize)?;
        if header[0..4] != ARCHIVE_MAGIC {
            return Err(CoreError::invalid_format("invalid archive magic"));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version > ARCHIVE_VERSION {
            return Err(CoreError::invalid_format(format!(
                "unsupported archive version: {version}"
            )));
        }

        Ok(())
    }

    /// Rebuilds the key index by scanning every record in the log.
    ///
    /// An incomplete record at the very end (an interrupted append) is cut
    /// off. A complete record with a bad checksum is an error.
    pub fn rebuild_index(&mut self) -> CoreResult<()> {
        self.index.clear();
        self.records = 0;
        self.tombstones = 0;
        self.dead_bytes = 0;

        let size = self.backend.size()?;
        let mut offset = ARCHIVE_HEADER_SIZE;

        while offset < size {
            if offset + 4 > size {
                break;
            }

            let len_bytes = self.backend.read_at(offset, 4)?;
            let record_len =
                u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]])
                    as usize;

            if record_len < EntryRecord::MIN_SIZE {
                return Err(CoreError::archive_corruption(format!(
                    "record at offset {offset} declares length {record_len}"
                )));
            }
            if offset + record_len as u64 > size {
                break;
            }

            let data = self.backend.read_at(offset, record_len)?;
            let record = EntryRecord::decode(&data)?;
            self.apply(&record, offset, record_len);

            offset += record_len as u64;
        }

        if offset < size {
            warn!(
                offset,
                discarded = size - offset,
                "discarding torn record at end of archive"
            );
            self.backend.truncate(offset)?;
        }

        Ok(())
    }

    fn apply(&mut self, record: &EntryRecord, offset: u64, len: usize) {
        self.records += 1;

        if record.is_tombstone() {
            self.tombstones += 1;
            self.dead_bytes += len as u64;
            if let Some(old) = self.index.remove(&record.key) {
                self.dead_bytes += old.len as u64;
            }
        } else if let Some(old) = self
            .index
            .insert(record.key.clone(), EntryLocation { offset, len })
        {
            self.dead_bytes += old.len as u64;
        }
    }

    fn append_record(&mut self, record: &EntryRecord) -> CoreResult<()> {
        let encoded = record.encode()?;
        let offset = self.backend.append(&encoded)?;
        self.apply(record, offset, encoded.len());
        Ok(())
    }

    /// Returns the file path, or `None` for in-memory archives.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns whether the archive holds no live keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Flushes pending writes to the OS.
    pub fn flush(&mut self) -> CoreResult<()> {
        self.backend.flush()?;
        Ok(())
    }

    /// Syncs the archive to durable storage.
    pub fn sync(&mut self) -> CoreResult<()> {
        self.backend.sync()?;
        Ok(())
    }

    /// Returns space accounting for the log.
    pub fn stats(&self) -> CoreResult<ArchiveStats> {
        Ok(ArchiveStats {
            live_entries: self.index.len(),
            live_bytes: self.index.values().map(|loc| loc.len as u64).sum(),
            records: self.records,
            tombstones: self.tombstones,
            dead_bytes: self.dead_bytes,
            total_bytes: self.backend.size()?,
        })
    }

    /// Rewrites the log keeping only live records.
    ///
    /// Records are re-verified while being copied; logical content is
    /// unchanged. File archives are replaced atomically.
    pub fn compact(&mut self) -> CoreResult<CompactionStats> {
        let bytes_before = self.backend.size()?;
        let input_records = self.records;

        let mut keys: Vec<&String> = self.index.keys().collect();
        keys.sort();

        let mut log = Self::header_bytes();
        let mut index = HashMap::with_capacity(keys.len());
        for key in keys {
            let loc = self.index[key];
            let data = self.backend.read_at(loc.offset, loc.len)?;
            EntryRecord::decode(&data)?;

            index.insert(
                key.clone(),
                EntryLocation {
                    offset: log.len() as u64,
                    len: loc.len,
                },
            );
            log.extend_from_slice(&data);
        }

        self.backend.replace(&log)?;

        let stats = CompactionStats {
            input_records,
            output_records: index.len(),
            bytes_before,
            bytes_after: log.len() as u64,
        };

        self.records = index.len();
        self.tombstones = 0;
        self.dead_bytes = 0;
        self.index = index;

        info!(
            input_records = stats.input_records,
            output_records = stats.output_records,
            bytes_saved = stats.bytes_saved(),
            "compacted archive"
        );
        Ok(stats)
    }
}

impl BackingStore for Archive {
    fn extract(&self, key: &str) -> CoreResult<Vec<u8>> {
        let loc = self
            .index
            .get(key)
            .copied()
            .ok_or_else(|| CoreError::entry_not_found(key))?;

        let data = self.backend.read_at(loc.offset, loc.len)?;
        let record = EntryRecord::decode(&data)?;
        if record.key != key {
            return Err(CoreError::archive_corruption(format!(
                "index points {key} at a record for {}",
                record.key
            )));
        }

        Ok(record.payload)
    }

    fn append(&mut self, key: &str, data: &[u8]) -> CoreResult<()> {
        if self.index.contains_key(key) {
            return Err(CoreError::EntryExists {
                key: key.to_string(),
            });
        }

        self.append_record(&EntryRecord::put(key, data.to_vec()))?;
        debug!(key, bytes = data.len(), "appended archive entry");
        Ok(())
    }

    fn purge(&mut self, key: &str) -> CoreResult<()> {
        if !self.index.contains_key(key) {
            return Ok(());
        }

        self.append_record(&EntryRecord::tombstone(key))?;
        debug!(key, "purged archive entry");
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.index.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("live_entries", &self.index.len())
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_and_extract() {
        let mut archive = Archive::in_memory();
        archive.append("chr1_seg_0", b"ACGT").unwrap();

        assert!(archive.contains("chr1_seg_0"));
        assert_eq!(archive.extract("chr1_seg_0").unwrap(), b"ACGT");
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn in_memory_archive_starts_with_header() {
        let archive = Archive::in_memory();
        let stats = archive.stats().unwrap();
        assert_eq!(stats.total_bytes, ARCHIVE_HEADER_SIZE);
        assert_eq!(stats.records, 0);
        archive.check_header().unwrap();
    }

    #[test]
    fn extract_missing_key() {
        let archive = Archive::in_memory();
        assert!(matches!(
            archive.extract("nope"),
            Err(CoreError::EntryNotFound { .. })
        ));
    }

    #[test]
    fn live_key_cannot_be_appended_twice() {
        let mut archive = Archive::in_memory();
        archive.append("head", b"v1").unwrap();

        assert!(matches!(
            archive.append("head", b"v2"),
            Err(CoreError::EntryExists { .. })
        ));

        archive.purge("head").unwrap();
        archive.append("head", b"v2").unwrap();
        assert_eq!(archive.extract("head").unwrap(), b"v2");
    }

    #[test]
    fn purge_hides_entry_and_is_idempotent() {
        let mut archive = Archive::in_memory();
        archive.append("a_seg_0", b"x").unwrap();

        archive.purge("a_seg_0").unwrap();
        archive.purge("a_seg_0").unwrap();
        archive.purge("never_written").unwrap();

        assert!(!archive.contains("a_seg_0"));
        assert!(archive.is_empty());
        assert_eq!(archive.stats().unwrap().tombstones, 1);
    }

    #[test]
    fn keys_are_sorted() {
        let mut archive = Archive::in_memory();
        for key in ["b_seg_1", "a_seg_0", "b_seg_0"] {
            archive.append(key, b"").unwrap();
        }
        assert_eq!(archive.keys(), vec!["a_seg_0", "b_seg_0", "b_seg_1"]);
    }

    #[test]
    fn index_rebuilt_on_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("regions.sqa");
        let config = Config::default();

        {
            let mut archive = Archive::open(&path, &config).unwrap();
            archive.append("r_seg_0", b"first").unwrap();
            archive.append("r_seg_1", b"second").unwrap();
            archive.purge("r_seg_0").unwrap();
            archive.sync().unwrap();
        }

        let archive = Archive::open(&path, &config).unwrap();
        assert_eq!(archive.keys(), vec!["r_seg_1"]);
        assert_eq!(archive.extract("r_seg_1").unwrap(), b"second");

        let stats = archive.stats().unwrap();
        assert_eq!(stats.records, 3);
        assert_eq!(stats.tombstones, 1);
        assert!(stats.dead_bytes > 0);
    }

    #[test]
    fn missing_file_without_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.sqa");

        let result = Archive::open(&path, &Config::default().create_if_missing(false));
        assert!(matches!(result, Err(CoreError::ArchiveNotFound { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn second_open_is_locked_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("regions.sqa");
        let config = Config::default();

        let _first = Archive::open(&path, &config).unwrap();
        assert!(matches!(
            Archive::open(&path, &config),
            Err(CoreError::ArchiveLocked)
        ));
        assert!(Archive::open(&path, &config.lock(false)).is_ok());
    }

    #[test]
    fn foreign_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"definitely not an archive").unwrap();

        let result = Archive::open(&path, &Config::default());
        assert!(matches!(result, Err(CoreError::InvalidFormat { .. })));
    }

    #[test]
    fn torn_tail_is_discarded() {
        let mut log = Archive::header_bytes();
        log.extend(EntryRecord::put("k1", b"kept".to_vec()).encode().unwrap());
        let intact = log.len();
        let torn = EntryRecord::put("k2", b"lost".to_vec()).encode().unwrap();
        log.extend_from_slice(&torn[..torn.len() - 3]);

        let archive = Archive::with_backend(Box::new(InMemoryBackend::with_data(log))).unwrap();
        assert_eq!(archive.keys(), vec!["k1"]);
        assert_eq!(archive.stats().unwrap().total_bytes, intact as u64);
    }

    #[test]
    fn corrupted_record_fails_open() {
        let mut log = Archive::header_bytes();
        log.extend(EntryRecord::put("k1", b"payload".to_vec()).encode().unwrap());
        let last = log.len() - 6;
        log[last] ^= 0xFF;

        let result = Archive::with_backend(Box::new(InMemoryBackend::with_data(log)));
        assert!(matches!(result, Err(CoreError::ChecksumMismatch { .. })));
    }

    #[test]
    fn compaction_keeps_only_live_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("regions.sqa");
        let config = Config::default();

        let mut archive = Archive::open(&path, &config).unwrap();
        for i in 0..10 {
            archive
                .append(&format!("r_seg_{i}"), &vec![i as u8; 100])
                .unwrap();
        }
        for i in 0..8 {
            archive.purge(&format!("r_seg_{i}")).unwrap();
        }

        let stats = archive.compact().unwrap();
        assert_eq!(stats.input_records, 18);
        assert_eq!(stats.output_records, 2);
        assert!(stats.bytes_saved() > 800);

        assert_eq!(archive.extract("r_seg_9").unwrap(), vec![9u8; 100]);
        archive.append("r_seg_10", b"after").unwrap();
        drop(archive);

        let archive = Archive::open(&path, &config).unwrap();
        assert_eq!(archive.keys(), vec!["r_seg_10", "r_seg_8", "r_seg_9"]);
        assert_eq!(archive.stats().unwrap().dead_bytes, 0);
    }
}
