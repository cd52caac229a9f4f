//! # SeqArc Testkit
//!
//! Test utilities for SeqArc.
//!
//! This crate provides:
//! - Catalog fixtures backed by memory or a temporary archive file
//! - Property-based generators for region edits using proptest
//! - A model harness that mirrors every edit on a plain `Vec<u8>`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use seqarc_testkit::prelude::*;
//!
//! #[test]
//! fn edits_match_model() {
//!     let mut harness = RegionHarness::new("chr1", 10, b"ACGT");
//!     harness.apply(&EditOperation::Append { data: b"TT".to_vec() });
//!     harness.verify();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod harness;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::harness::*;
}

pub use fixtures::*;
pub use generators::*;
pub use harness::*;
