//! Catalog configuration.

use crate::compression::CompressionConfig;

/// Default number of units per segment.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Configuration for opening an archive and the catalog stored in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Segment capacity given to newly created regions.
    pub default_capacity: usize,

    /// How segments are compressed when persisted.
    pub compression: CompressionConfig,

    /// Whether to create the archive file if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to hold an advisory writer lock on the archive.
    pub lock: bool,

    /// Whether `save` syncs the archive to disk (otherwise it only flushes).
    pub sync_on_save: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_CAPACITY,
            compression: CompressionConfig::lz4(),
            create_if_missing: true,
            lock: true,
            sync_on_save: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capacity of newly created regions.
    #[must_use]
    pub const fn default_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = capacity;
        self
    }

    /// Sets the compression used for persisted segments.
    #[must_use]
    pub const fn compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    /// Sets whether to create a missing archive.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to take the writer lock.
    #[must_use]
    pub const fn lock(mut self, value: bool) -> Self {
        self.lock = value;
        self
    }

    /// Sets whether `save` syncs to disk.
    #[must_use]
    pub const fn sync_on_save(mut self, value: bool) -> Self {
        self.sync_on_save = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::CompressionMethod;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.default_capacity, 1000);
        assert_eq!(config.compression.method, CompressionMethod::Lz4);
        assert!(config.create_if_missing);
        assert!(config.lock);
        assert!(config.sync_on_save);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .default_capacity(64)
            .compression(CompressionConfig::zstd(9))
            .lock(false)
            .sync_on_save(false);

        assert_eq!(config.default_capacity, 64);
        assert_eq!(config.compression, CompressionConfig::zstd(9));
        assert!(!config.lock);
        assert!(!config.sync_on_save);
    }
}
