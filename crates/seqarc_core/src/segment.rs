//! Fixed-capacity chunks of a region.
//!
//! A segment holds up to `capacity` units of its region's content. It is
//! either resident (content in memory) or archived (content compressed in the
//! backing store under the segment's key). The only way to free memory is
//! [`Segment::persist`]; any mutation brings an archived segment back into
//! memory. The archive entry it came from is left alone until the next
//! persist replaces it or a purge drops it, so unsaved edits never touch what
//! is already stored.

use crate::archive::BackingStore;
use crate::compression::{self, CompressionConfig};
use crate::error::{CoreError, CoreResult};
use std::ops::Range;
use tracing::debug;

/// Where a segment's content currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentState {
    /// Content is in memory.
    Resident(Vec<u8>),
    /// Content is in the backing store under the segment's key.
    Archived,
}

/// What the backing store holds under a segment's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    /// Nothing stored yet.
    Missing,
    /// The stored entry matches the segment's content.
    Current,
    /// The stored entry predates an edit.
    Stale,
}

/// One chunk of a region.
#[derive(Debug, Clone)]
pub struct Segment {
    key: String,
    capacity: usize,
    size: usize,
    state: SegmentState,
    entry: Entry,
}

impl Segment {
    /// Creates a resident segment.
    ///
    /// `content` must not exceed `capacity`.
    pub(crate) fn new(key: String, capacity: usize, content: Vec<u8>) -> Self {
        debug_assert!(content.len() <= capacity);
        Self {
            key,
            capacity,
            size: content.len(),
            state: SegmentState::Resident(content),
            entry: Entry::Missing,
        }
    }

    /// Creates a segment whose content is already in the backing store.
    pub(crate) fn archived(key: String, capacity: usize, size: usize) -> Self {
        Self {
            key,
            capacity,
            size,
            state: SegmentState::Archived,
            entry: Entry::Current,
        }
    }

    /// Number of units held. Known without I/O.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Maximum number of units this segment can hold.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.capacity
    }

    /// Backing store key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns whether the content is in memory.
    #[must_use]
    pub fn is_resident(&self) -> bool {
        matches!(self.state, SegmentState::Resident(_))
    }

    /// Current residency.
    #[must_use]
    pub fn state(&self) -> &SegmentState {
        &self.state
    }

    /// Returns whether the backing store holds an entry under this
    /// segment's key, current or not.
    #[must_use]
    pub fn has_entry(&self) -> bool {
        self.entry != Entry::Missing
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let start = range.start.min(self.size);
        let end = range.end.min(self.size).max(start);
        start..end
    }

    /// Fetches and decodes the archived content, checking it against the
    /// cached size.
    fn load(&self, store: &dyn BackingStore) -> CoreResult<Vec<u8>> {
        let blob = store.extract(&self.key)?;
        let content = compression::decode(&blob)?;
        if content.len() != self.size {
            return Err(CoreError::segment_corruption(
                &self.key,
                format!(
                    "archived chunk holds {} units, expected {}",
                    content.len(),
                    self.size
                ),
            ));
        }
        Ok(content)
    }

    /// Reads `range` of this segment's content.
    ///
    /// The range is clamped to the segment. Archived segments are read from
    /// the store without becoming resident.
    pub fn read(&self, store: &dyn BackingStore, range: Range<usize>) -> CoreResult<Vec<u8>> {
        let range = self.clamp(range);
        match &self.state {
            SegmentState::Resident(content) => Ok(content[range].to_vec()),
            SegmentState::Archived => {
                let content = self.load(store)?;
                Ok(content[range].to_vec())
            }
        }
    }

    /// Brings an archived segment into memory.
    ///
    /// The archive entry stays in place. State is untouched if the entry
    /// cannot be loaded.
    pub fn materialize(&mut self, store: &dyn BackingStore) -> CoreResult<()> {
        if self.is_resident() {
            return Ok(());
        }

        let content = self.load(store)?;
        self.state = SegmentState::Resident(content);

        debug!(key = %self.key, size = self.size, "materialized segment");
        Ok(())
    }

    /// Replaces `range` with `new` and returns whatever no longer fits.
    ///
    /// The spliced content keeps its first `capacity` units; the rest is
    /// returned as overflow. The segment is resident afterwards.
    pub fn write(
        &mut self,
        store: &mut dyn BackingStore,
        new: &[u8],
        range: Range<usize>,
    ) -> CoreResult<Vec<u8>> {
        self.materialize(&*store)?;
        let range = self.clamp(range);

        let SegmentState::Resident(content) = &mut self.state else {
            return Err(CoreError::invalid_operation(format!(
                "segment {} is not resident after materialize",
                self.key
            )));
        };

        content.splice(range, new.iter().copied());
        let overflow = if content.len() > self.capacity {
            content.split_off(self.capacity)
        } else {
            Vec::new()
        };
        self.size = content.len();
        if self.entry == Entry::Current {
            self.entry = Entry::Stale;
        }

        Ok(overflow)
    }

    /// Appends `seq`, returning the overflow.
    pub fn append(&mut self, store: &mut dyn BackingStore, seq: &[u8]) -> CoreResult<Vec<u8>> {
        let size = self.size;
        self.write(store, seq, size..size)
    }

    /// Prepends `seq`, returning the overflow.
    pub fn prepend(&mut self, store: &mut dyn BackingStore, seq: &[u8]) -> CoreResult<Vec<u8>> {
        self.write(store, seq, 0..0)
    }

    /// Removes `range`.
    pub fn clear(&mut self, store: &mut dyn BackingStore, range: Range<usize>) -> CoreResult<()> {
        self.write(store, &[], range)?;
        Ok(())
    }

    /// Detaches the segment from its current archive entry before the owning
    /// region moves to another archive. The old entry is not touched.
    pub fn relocate(&mut self, store: &dyn BackingStore) -> CoreResult<()> {
        self.materialize(store)?;
        self.entry = Entry::Missing;
        Ok(())
    }

    /// Compresses a resident segment into the store and frees its memory.
    ///
    /// A stale entry is purged before the new one is appended. A resident
    /// segment whose entry is still current is dropped from memory without
    /// I/O. Does nothing if the segment is already archived.
    pub fn persist(
        &mut self,
        store: &mut dyn BackingStore,
        compression: &CompressionConfig,
    ) -> CoreResult<()> {
        let SegmentState::Resident(content) = &self.state else {
            return Ok(());
        };

        if self.entry == Entry::Current {
            self.state = SegmentState::Archived;
            return Ok(());
        }
        if self.entry == Entry::Stale {
            store.purge(&self.key)?;
            self.entry = Entry::Missing;
        }

        let blob = compression::encode(content, compression)?;
        store.append(&self.key, &blob)?;

        debug!(
            key = %self.key,
            size = self.size,
            stored = blob.len(),
            "persisted segment"
        );
        self.state = SegmentState::Archived;
        self.entry = Entry::Current;
        Ok(())
    }

    /// Removes the segment's archive entry, if any, and drops its content.
    pub fn purge(&mut self, store: &mut dyn BackingStore) -> CoreResult<()> {
        if self.has_entry() {
            store.purge(&self.key)?;
            self.entry = Entry::Missing;
        }
        self.state = SegmentState::Resident(Vec::new());
        self.size = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Archive;

    fn resident(content: &[u8]) -> Segment {
        Segment::new("chr1_seg_0".to_string(), 10, content.to_vec())
    }

    #[test]
    fn accessors() {
        let seg = resident(b"ACGT");
        assert_eq!(seg.size(), 4);
        assert_eq!(seg.max_size(), 10);
        assert_eq!(seg.key(), "chr1_seg_0");
        assert!(seg.is_resident());
    }

    #[test]
    fn read_clamps_range() {
        let store = Archive::in_memory();
        let seg = resident(b"ACGTACGT");

        assert_eq!(seg.read(&store, 2..5).unwrap(), b"GTA");
        assert_eq!(seg.read(&store, 6..100).unwrap(), b"GT");
        assert_eq!(seg.read(&store, 5..3).unwrap(), b"");
    }

    #[test]
    fn write_splices_and_overflows() {
        let mut store = Archive::in_memory();
        let mut seg = resident(b"0123456789");

        let overflow = seg.write(&mut store, b"ab", 3..4).unwrap();
        assert_eq!(seg.read(&store, 0..10).unwrap(), b"012ab45678");
        assert_eq!(overflow, b"9");
        assert_eq!(seg.size(), 10);

        let overflow = seg.write(&mut store, b"", 0..5).unwrap();
        assert!(overflow.is_empty());
        assert_eq!(seg.size(), 5);
    }

    #[test]
    fn append_prepend_clear() {
        let mut store = Archive::in_memory();
        let mut seg = resident(b"CCC");

        assert!(seg.append(&mut store, b"GG").unwrap().is_empty());
        assert!(seg.prepend(&mut store, b"AA").unwrap().is_empty());
        assert_eq!(seg.read(&store, 0..10).unwrap(), b"AACCCGG");

        seg.clear(&mut store, 2..5).unwrap();
        assert_eq!(seg.read(&store, 0..10).unwrap(), b"AAGG");

        let overflow = seg.append(&mut store, b"TTTTTTTTT").unwrap();
        assert_eq!(seg.size(), 10);
        assert_eq!(overflow, b"TTT");
    }

    #[test]
    fn persist_then_read_without_materializing() {
        let mut store = Archive::in_memory();
        let mut seg = resident(b"GATTACA");

        seg.persist(&mut store, &CompressionConfig::default()).unwrap();
        assert!(!seg.is_resident());
        assert!(store.contains("chr1_seg_0"));
        assert_eq!(seg.size(), 7);

        assert_eq!(seg.read(&store, 1..4).unwrap(), b"ATT");
        assert!(!seg.is_resident());

        // Second persist is a no-op rather than a duplicate append.
        seg.persist(&mut store, &CompressionConfig::default()).unwrap();
    }

    #[test]
    fn write_keeps_stored_entry_until_persist() {
        let mut store = Archive::in_memory();
        let mut seg = resident(b"GATTACA");
        seg.persist(&mut store, &CompressionConfig::zstd(3)).unwrap();

        seg.write(&mut store, b"C", 0..1).unwrap();
        assert!(seg.is_resident());
        assert!(seg.has_entry());
        assert_eq!(seg.read(&store, 0..7).unwrap(), b"CATTACA");

        // The stored copy still holds the content from before the edit.
        let stored = compression::decode(&store.extract("chr1_seg_0").unwrap()).unwrap();
        assert_eq!(stored, b"GATTACA");

        seg.persist(&mut store, &CompressionConfig::none()).unwrap();
        let stored = compression::decode(&store.extract("chr1_seg_0").unwrap()).unwrap();
        assert_eq!(stored, b"CATTACA");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unchanged_segment_persists_without_io() {
        let mut store = Archive::in_memory();
        let mut seg = resident(b"GATTACA");
        seg.persist(&mut store, &CompressionConfig::default()).unwrap();
        let records = store.stats().unwrap().records;

        seg.materialize(&store).unwrap();
        seg.persist(&mut store, &CompressionConfig::default()).unwrap();

        assert!(!seg.is_resident());
        assert_eq!(store.stats().unwrap().records, records);
    }

    #[test]
    fn empty_segment_round_trips_through_store() {
        let mut store = Archive::in_memory();
        let mut seg = resident(b"");

        seg.persist(&mut store, &CompressionConfig::default()).unwrap();
        assert!(!seg.is_resident());
        assert_eq!(seg.read(&store, 0..10).unwrap(), b"");

        seg.materialize(&store).unwrap();
        assert_eq!(seg.state(), &SegmentState::Resident(Vec::new()));
    }

    #[test]
    fn missing_entry_leaves_segment_unchanged() {
        let mut store = Archive::in_memory();
        let mut seg = Segment::archived("gone_seg_3".to_string(), 10, 4);

        let result = seg.write(&mut store, b"X", 0..0);
        assert!(matches!(result, Err(CoreError::EntryNotFound { .. })));
        assert!(!seg.is_resident());
        assert_eq!(seg.size(), 4);
    }

    #[test]
    fn size_mismatch_is_corruption() {
        let mut store = Archive::in_memory();
        let blob = compression::encode(b"ACG", &CompressionConfig::default()).unwrap();
        store.append("chr1_seg_0", &blob).unwrap();

        let seg = Segment::archived("chr1_seg_0".to_string(), 10, 5);
        assert!(matches!(
            seg.read(&store, 0..5),
            Err(CoreError::SegmentCorruption { .. })
        ));
    }

    #[test]
    fn purge_removes_entry() {
        let mut store = Archive::in_memory();
        let mut seg = resident(b"ACGT");
        seg.persist(&mut store, &CompressionConfig::default()).unwrap();

        seg.purge(&mut store).unwrap();
        assert!(store.is_empty());
        assert_eq!(seg.size(), 0);
        assert!(!seg.has_entry());
    }

    #[test]
    fn purge_of_edited_segment_removes_stale_entry() {
        let mut store = Archive::in_memory();
        let mut seg = resident(b"ACGT");
        seg.persist(&mut store, &CompressionConfig::default()).unwrap();
        seg.append(&mut store, b"T").unwrap();

        seg.purge(&mut store).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn relocate_detaches_from_entry() {
        let mut store = Archive::in_memory();
        let mut seg = resident(b"ACGT");
        seg.persist(&mut store, &CompressionConfig::default()).unwrap();

        seg.relocate(&store).unwrap();
        assert!(seg.is_resident());
        assert!(!seg.has_entry());
        // The old archive keeps its entry; the segment just forgets it.
        assert!(store.contains("chr1_seg_0"));
        assert_eq!(seg.read(&store, 0..4).unwrap(), b"ACGT");

        let mut target = Archive::in_memory();
        seg.persist(&mut target, &CompressionConfig::default()).unwrap();
        assert!(target.contains("chr1_seg_0"));
    }
}
