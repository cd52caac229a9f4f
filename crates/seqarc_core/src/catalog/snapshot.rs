//! The catalog's head record.
//!
//! ```text
//! | "SQHD" (4) | version (2) | CBOR-encoded CatalogSnapshot |
//! ```
//!
//! The snapshot records every region's layout and segment keys. Segments are
//! always reloaded in the archived state.

use crate::error::{CoreError, CoreResult};
use crate::region::Region;
use crate::segment::Segment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Magic bytes for the head record.
pub const HEAD_MAGIC: [u8; 4] = *b"SQHD";

/// Current head record version.
pub const HEAD_VERSION: u16 = 1;

/// Persisted state of a whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Archive path at save time. Informational only; loading rebinds to the
    /// path actually opened.
    pub path: Option<PathBuf>,
    /// Capacity for newly created regions.
    pub default_capacity: usize,
    /// Regions in name order.
    pub regions: Vec<RegionSnapshot>,
}

/// Persisted state of one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSnapshot {
    /// Region name.
    pub name: String,
    /// Units per segment.
    pub capacity: usize,
    /// Next segment key index.
    pub next_index: u64,
    /// Segments in order.
    pub segments: Vec<SegmentSnapshot>,
}

/// Persisted state of one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSnapshot {
    /// Archive key holding the segment.
    pub key: String,
    /// Units stored under the key.
    pub size: usize,
}

impl RegionSnapshot {
    /// Captures a region whose segments have all been persisted.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidOperation`] if any segment is still resident.
    pub fn capture(region: &Region) -> CoreResult<Self> {
        if region.resident_count() > 0 {
            return Err(CoreError::invalid_operation(format!(
                "region {} has {} unpersisted segments",
                region.name(),
                region.resident_count()
            )));
        }

        Ok(Self {
            name: region.name().to_string(),
            capacity: region.capacity(),
            next_index: region.next_index(),
            segments: region
                .segments()
                .iter()
                .map(|seg| SegmentSnapshot {
                    key: seg.key().to_string(),
                    size: seg.size(),
                })
                .collect(),
        })
    }

    /// Rebuilds the region with every segment archived, bound to `path`.
    pub fn restore(self, path: Option<PathBuf>) -> CoreResult<Region> {
        let capacity = self.capacity;
        let segments = self
            .segments
            .into_iter()
            .map(|seg| Segment::archived(seg.key, capacity, seg.size))
            .collect();
        Region::from_parts(path, self.name, capacity, self.next_index, segments)
    }
}

impl CatalogSnapshot {
    /// Encodes the head record.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&HEAD_MAGIC);
        buf.extend_from_slice(&HEAD_VERSION.to_le_bytes());

        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::invalid_format(format!("head record encoding failed: {e}")))?;
        Ok(buf)
    }

    /// Decodes a head record.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() < 6 {
            return Err(CoreError::invalid_format("head record too short"));
        }
        if data[0..4] != HEAD_MAGIC {
            return Err(CoreError::invalid_format("invalid head record magic"));
        }

        let version = u16::from_le_bytes([data[4], data[5]]);
        if version > HEAD_VERSION {
            return Err(CoreError::invalid_format(format!(
                "unsupported head record version: {version}"
            )));
        }

        ciborium::from_reader(&data[6..])
            .map_err(|e| CoreError::invalid_format(format!("head record decoding failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Archive;
    use crate::compression::CompressionConfig;

    fn sample() -> CatalogSnapshot {
        CatalogSnapshot {
            path: Some(PathBuf::from("/data/genome.sqa")),
            default_capacity: 10,
            regions: vec![RegionSnapshot {
                name: "chr1".to_string(),
                capacity: 10,
                next_index: 3,
                segments: vec![
                    SegmentSnapshot {
                        key: "chr1_seg_0".to_string(),
                        size: 10,
                    },
                    SegmentSnapshot {
                        key: "chr1_seg_2".to_string(),
                        size: 4,
                    },
                ],
            }],
        }
    }

    #[test]
    fn head_record_is_framed() {
        let encoded = sample().encode().unwrap();
        assert_eq!(&encoded[0..4], b"SQHD");
        assert_eq!(CatalogSnapshot::decode(&encoded).unwrap(), sample());
    }

    #[test]
    fn bad_head_records_rejected() {
        assert!(matches!(
            CatalogSnapshot::decode(b"SQ"),
            Err(CoreError::InvalidFormat { .. })
        ));
        assert!(matches!(
            CatalogSnapshot::decode(b"NOPE\x01\x00"),
            Err(CoreError::InvalidFormat { .. })
        ));
        assert!(matches!(
            CatalogSnapshot::decode(b"SQHD\x09\x00"),
            Err(CoreError::InvalidFormat { .. })
        ));
        assert!(matches!(
            CatalogSnapshot::decode(b"SQHD\x01\x00\xff\xff"),
            Err(CoreError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn capture_requires_persisted_segments() {
        let mut store = Archive::in_memory();
        let mut region = Region::from_content(None, "chr1", 4, b"ACGTACGTAC").unwrap();

        assert!(matches!(
            RegionSnapshot::capture(&region),
            Err(CoreError::InvalidOperation { .. })
        ));

        region
            .persist_all(&mut store, &CompressionConfig::default())
            .unwrap();
        let snapshot = RegionSnapshot::capture(&region).unwrap();
        assert_eq!(snapshot.next_index, 3);
        assert_eq!(
            snapshot.segments.iter().map(|s| s.size).collect::<Vec<_>>(),
            vec![4, 4, 2]
        );

        let restored = snapshot.restore(Some(PathBuf::from("/moved.sqa"))).unwrap();
        assert_eq!(restored.segment_sizes(), region.segment_sizes());
        assert_eq!(restored.read_all(&store).unwrap(), b"ACGTACGTAC");
        assert_eq!(restored.path(), Some(std::path::Path::new("/moved.sqa")));
    }
}
