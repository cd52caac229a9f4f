//! The archive container segments are persisted into.
//!
//! An archive is one file holding an append-only log of keyed records.
//! Updating a key means purging it (a tombstone record) and appending it
//! again; the space taken by superseded records is reclaimed by compaction.
//!
//! ## Record Format
//!
//! ```text
//! | record_len (4) | flags (1) | key_len (2) | key (K) | payload (N) | crc32 (4) |
//! ```
//!
//! Flags:
//! - `0x01` = tombstone (key purged)

pub(crate) mod lock;
mod record;
mod store;

pub use record::{EntryFlags, EntryRecord};
pub use store::{
    Archive, ArchiveStats, BackingStore, CompactionStats, ARCHIVE_HEADER_SIZE, ARCHIVE_MAGIC,
    ARCHIVE_VERSION,
};
