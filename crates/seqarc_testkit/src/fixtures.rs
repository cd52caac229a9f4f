//! Test fixtures and catalog helpers.
//!
//! Provides convenience functions for setting up test catalogs
//! and common test scenarios.

use seqarc_core::{Catalog, Config};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Segment capacity used by fixtures, small enough that short test content
/// spans several segments.
pub const TEST_CAPACITY: usize = 10;

/// Default configuration for test catalogs.
#[must_use]
pub fn test_config() -> Config {
    Config::default().default_capacity(TEST_CAPACITY)
}

/// A test catalog with automatic cleanup.
pub struct TestCatalog {
    /// The catalog instance.
    pub catalog: Catalog,
    path: Option<PathBuf>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestCatalog {
    /// Creates a new in-memory test catalog.
    pub fn memory() -> Self {
        Self {
            catalog: Catalog::in_memory(&test_config()).expect("Failed to create in-memory catalog"),
            path: None,
            _temp_dir: None,
        }
    }

    /// Creates a new catalog in a temporary archive file.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("test.sqa");
        let catalog = Catalog::create(&path, &test_config()).expect("Failed to create catalog");

        Self {
            catalog,
            path: Some(path),
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the archive path if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Saves, closes and reopens a file-based catalog.
    ///
    /// # Panics
    ///
    /// Panics for in-memory catalogs or if any step fails.
    pub fn reopen(&mut self) {
        let path = self.path.clone().expect("Only file catalogs can be reopened");
        self.catalog.save().expect("Failed to save catalog");

        // Release the archive lock before opening again.
        let placeholder = Catalog::in_memory(&test_config()).expect("Failed to create placeholder");
        drop(std::mem::replace(&mut self.catalog, placeholder));

        self.catalog = Catalog::open(&path, &test_config()).expect("Failed to reopen catalog");
    }
}

impl std::ops::Deref for TestCatalog {
    type Target = Catalog;

    fn deref(&self) -> &Self::Target {
        &self.catalog
    }
}

impl std::ops::DerefMut for TestCatalog {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.catalog
    }
}

/// Runs a test with a temporary in-memory catalog.
pub fn with_temp_catalog<F, R>(f: F) -> R
where
    F: FnOnce(&mut Catalog) -> R,
{
    let mut test_catalog = TestCatalog::memory();
    f(&mut test_catalog.catalog)
}

/// Runs a test with a catalog in a temporary archive file.
pub fn with_file_catalog<F, R>(f: F) -> R
where
    F: FnOnce(&mut Catalog, &Path) -> R,
{
    let mut test_catalog = TestCatalog::file();
    let path = test_catalog
        .path()
        .expect("File catalog should have a path")
        .to_path_buf();
    f(&mut test_catalog.catalog, &path)
}

/// Deterministic content of `len` units cycling through `ACGT`.
#[must_use]
pub fn nucleotides(len: usize) -> Vec<u8> {
    b"ACGT".iter().copied().cycle().take(len).collect()
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a catalog holding `region_count` regions named `chr0..`, the
    /// i-th with `base_len * (i + 1)` units.
    pub fn populated_catalog(region_count: usize, base_len: usize) -> TestCatalog {
        let mut test_catalog = TestCatalog::memory();
        for i in 0..region_count {
            test_catalog
                .create_region(&format!("chr{i}"), &nucleotides(base_len * (i + 1)))
                .expect("Failed to create region");
        }
        test_catalog
    }
}
