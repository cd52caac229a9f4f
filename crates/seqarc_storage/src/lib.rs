//! # SeqArc Storage
//!
//! The byte layer underneath a SeqArc archive file.
//!
//! A backend is an **opaque, append-only byte log**. It knows nothing about
//! archive records, segment keys or compression; `seqarc_core` frames and
//! indexes everything it writes here.
//!
//! ## Operations
//!
//! - `append` bytes at the end and learn their offset
//! - `read_at` any previously appended range
//! - `truncate` a torn tail after a crash
//! - `replace` the whole log atomically (used by archive compaction)
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests and throwaway catalogs
//! - [`FileBackend`] - A single file on disk
//!
//! ## Example
//!
//! ```rust
//! use seqarc_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"chunk bytes").unwrap();
//! assert_eq!(backend.read_at(offset, 5).unwrap(), b"chunk");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
