//! Chunk compression.
//!
//! Every archived segment is stored as one self-describing blob:
//!
//! ```text
//! | method (1) | compressed bytes (N) |
//! ```
//!
//! The method byte travels with the blob, so an archive written with LZ4 can
//! be read by a catalog configured for Zstd and vice versa. Only the write
//! path consults [`CompressionConfig`].

use crate::error::{CoreError, CoreResult};

/// Compression method for archived chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionMethod {
    /// Stored as-is.
    None = 0,
    /// LZ4 (fast, moderate ratio).
    #[default]
    Lz4 = 1,
    /// Zstandard (slower, better ratio).
    Zstd = 2,
}

impl CompressionMethod {
    /// Converts a method byte back into a method.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Lz4),
            2 => Some(Self::Zstd),
            _ => None,
        }
    }

    /// Returns the method byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parses a method name as accepted on the command line.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "lz4" => Some(Self::Lz4),
            "zstd" => Some(Self::Zstd),
            _ => None,
        }
    }
}

/// How new chunks are compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionConfig {
    /// Method used when persisting a segment.
    pub method: CompressionMethod,
    /// Zstd compression level (ignored by the other methods).
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            method: CompressionMethod::Lz4,
            level: 3,
        }
    }
}

impl CompressionConfig {
    /// Stores chunks uncompressed.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            method: CompressionMethod::None,
            level: 0,
        }
    }

    /// LZ4 compression.
    #[must_use]
    pub const fn lz4() -> Self {
        Self {
            method: CompressionMethod::Lz4,
            level: 0,
        }
    }

    /// Zstd compression at the given level.
    #[must_use]
    pub const fn zstd(level: i32) -> Self {
        Self {
            method: CompressionMethod::Zstd,
            level,
        }
    }
}

/// Compresses `data` into a framed blob.
pub fn encode(data: &[u8], config: &CompressionConfig) -> CoreResult<Vec<u8>> {
    let mut blob = vec![config.method.as_u8()];

    match config.method {
        CompressionMethod::None => blob.extend_from_slice(data),
        CompressionMethod::Lz4 => blob.extend(lz4_flex::compress_prepend_size(data)),
        CompressionMethod::Zstd => {
            let compressed = zstd::bulk::compress(data, config.level)
                .map_err(|e| CoreError::compression(format!("zstd compression failed: {e}")))?;
            blob.extend(compressed);
        }
    }

    Ok(blob)
}

/// Decompresses a framed blob produced by [`encode`].
pub fn decode(blob: &[u8]) -> CoreResult<Vec<u8>> {
    let (&tag, body) = blob
        .split_first()
        .ok_or_else(|| CoreError::compression("empty chunk blob"))?;

    let method = CompressionMethod::from_u8(tag)
        .ok_or_else(|| CoreError::compression(format!("unknown compression method {tag}")))?;

    match method {
        CompressionMethod::None => Ok(body.to_vec()),
        CompressionMethod::Lz4 => lz4_flex::decompress_size_prepended(body)
            .map_err(|e| CoreError::compression(format!("lz4 decompression failed: {e}"))),
        CompressionMethod::Zstd => zstd::stream::decode_all(body)
            .map_err(|e| CoreError::compression(format!("zstd decompression failed: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        b"ACGTTGCAACGTTGCA".repeat(64)
    }

    #[test]
    fn method_byte_conversion() {
        assert_eq!(CompressionMethod::from_u8(0), Some(CompressionMethod::None));
        assert_eq!(CompressionMethod::from_u8(1), Some(CompressionMethod::Lz4));
        assert_eq!(CompressionMethod::from_u8(2), Some(CompressionMethod::Zstd));
        assert_eq!(CompressionMethod::from_u8(9), None);
        assert_eq!(CompressionMethod::Zstd.as_u8(), 2);
        assert_eq!(
            CompressionMethod::from_name("ZSTD"),
            Some(CompressionMethod::Zstd)
        );
        assert_eq!(CompressionMethod::from_name("gzip"), None);
    }

    #[test]
    fn lz4_blob_shrinks_repetitive_chunk() {
        let data = sample();
        let blob = encode(&data, &CompressionConfig::lz4()).unwrap();

        assert_eq!(blob[0], CompressionMethod::Lz4.as_u8());
        assert!(blob.len() < data.len());
        assert_eq!(decode(&blob).unwrap(), data);
    }

    #[test]
    fn zstd_blob_shrinks_repetitive_chunk() {
        let data = sample();
        let blob = encode(&data, &CompressionConfig::zstd(5)).unwrap();

        assert_eq!(blob[0], CompressionMethod::Zstd.as_u8());
        assert!(blob.len() < data.len());
        assert_eq!(decode(&blob).unwrap(), data);
    }

    #[test]
    fn uncompressed_blob_is_tagged_copy() {
        let blob = encode(b"GATTACA", &CompressionConfig::none()).unwrap();
        assert_eq!(blob, b"\x00GATTACA");
        assert_eq!(decode(&blob).unwrap(), b"GATTACA");
    }

    #[test]
    fn empty_chunk_encodes_for_every_method() {
        for config in [
            CompressionConfig::none(),
            CompressionConfig::lz4(),
            CompressionConfig::zstd(3),
        ] {
            let blob = encode(b"", &config).unwrap();
            assert!(decode(&blob).unwrap().is_empty());
        }
    }

    #[test]
    fn malformed_blobs_are_rejected() {
        assert!(matches!(decode(b""), Err(CoreError::Compression { .. })));
        assert!(matches!(decode(b"\x07abc"), Err(CoreError::Compression { .. })));
        assert!(matches!(
            decode(b"\x01\x05\x00\x00\x00"),
            Err(CoreError::Compression { .. })
        ));
    }

    #[test]
    fn default_config_is_lz4() {
        let config = CompressionConfig::default();
        assert_eq!(config.method, CompressionMethod::Lz4);
        assert_eq!(config.level, 3);
    }
}
