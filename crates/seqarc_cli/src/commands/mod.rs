//! CLI command implementations.

pub mod cat;
pub mod compact;
pub mod edit;
pub mod inspect;

use seqarc_core::{Catalog, CompressionConfig, CompressionMethod, Config};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the CLI itself rather than the archive.
#[derive(Debug, Error)]
pub enum CliError {
    /// A command needs `--path`.
    #[error("archive path required for {command}")]
    MissingPath {
        /// Subcommand name.
        command: &'static str,
    },

    /// Neither `--data` nor `--file` was given.
    #[error("no content given: pass --data or --file")]
    MissingInput,

    /// Unrecognised `--compression` value.
    #[error("unknown compression method: {0} (expected none, lz4 or zstd)")]
    UnknownCompression(String),

    /// Unrecognised `--format` value.
    #[error("unknown output format: {0} (expected text or json)")]
    UnknownFormat(String),
}

/// Zstd level used when the CLI writes with zstd.
const ZSTD_LEVEL: i32 = 9;

/// Unwraps the global `--path` argument.
pub fn require_path(path: Option<PathBuf>, command: &'static str) -> Result<PathBuf, CliError> {
    path.ok_or(CliError::MissingPath { command })
}

/// Collects content from `--data` or `--file`.
pub fn input(data: Option<String>, file: Option<PathBuf>) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    match (data, file) {
        (Some(data), _) => Ok(data.into_bytes()),
        (None, Some(file)) => Ok(std::fs::read(file)?),
        (None, None) => Err(CliError::MissingInput.into()),
    }
}

/// Parses a `--compression` value.
pub fn compression(name: &str) -> Result<CompressionConfig, CliError> {
    match CompressionMethod::from_name(name) {
        Some(CompressionMethod::None) => Ok(CompressionConfig::none()),
        Some(CompressionMethod::Lz4) => Ok(CompressionConfig::lz4()),
        Some(CompressionMethod::Zstd) => Ok(CompressionConfig::zstd(ZSTD_LEVEL)),
        None => Err(CliError::UnknownCompression(name.to_string())),
    }
}

/// Turns optional `--start`/`--end` flags into a range.
pub fn bounds(start: Option<i64>, end: Option<i64>) -> (Bound<i64>, Bound<i64>) {
    (
        start.map_or(Bound::Unbounded, Bound::Included),
        end.map_or(Bound::Unbounded, Bound::Excluded),
    )
}

/// Opens an existing catalog for reading.
pub fn open_existing(path: &Path) -> Result<Catalog, Box<dyn std::error::Error>> {
    let config = Config::default().create_if_missing(false);
    Ok(Catalog::open(path, &config)?)
}

/// Opens a catalog for editing, creating the archive if needed.
pub fn open_for_edit(
    path: &Path,
    compression: CompressionConfig,
) -> Result<Catalog, Box<dyn std::error::Error>> {
    let config = Config::default().compression(compression);
    Ok(Catalog::open_or_create(path, &config)?)
}
