//! # SeqArc Core
//!
//! Long, editable byte sequences split into fixed-capacity chunks and kept
//! compressed in a single archive file.
//!
//! This crate provides:
//! - [`Archive`] - a keyed, append-only record log with tombstones,
//!   checksums and compaction
//! - [`Segment`] - one chunk, resident in memory or archived
//! - [`Region`] - a named sequence of segments with offset translation and
//!   the multi-segment splice
//! - [`Catalog`] - named regions persisted together with a head record
//!
//! Edits only ever load the segments they touch; everything else stays
//! compressed in the archive until read.
//!
//! ## Example
//!
//! ```rust
//! use seqarc_core::{Catalog, Config};
//!
//! let mut catalog = Catalog::in_memory(&Config::default().default_capacity(10)).unwrap();
//! catalog.create_region("chr1", &[b'A'; 25]).unwrap();
//! catalog.write("chr1", b"XY", 8..12).unwrap();
//!
//! assert_eq!(catalog.read("chr1", 8..10).unwrap(), b"XY");
//! assert_eq!(catalog.region("chr1").unwrap().segment_sizes(), vec![10, 10, 3]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod archive;
mod catalog;
mod compression;
mod config;
mod error;
mod region;
mod segment;

pub use archive::{
    Archive, ArchiveStats, BackingStore, CompactionStats, EntryFlags, EntryRecord,
    ARCHIVE_HEADER_SIZE, ARCHIVE_MAGIC, ARCHIVE_VERSION,
};
pub use catalog::{
    Catalog, CatalogSnapshot, RegionSnapshot, SegmentSnapshot, HEAD_KEY, HEAD_MAGIC, HEAD_VERSION,
};
pub use compression::{decode as decode_chunk, encode as encode_chunk};
pub use compression::{CompressionConfig, CompressionMethod};
pub use config::{Config, DEFAULT_CAPACITY};
pub use error::{CoreError, CoreResult};
pub use region::Region;
pub use segment::{Segment, SegmentState};

/// Crate version, recorded by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
