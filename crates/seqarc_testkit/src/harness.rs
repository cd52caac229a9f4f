//! Model-checking harness for regions.
//!
//! Every edit is applied both to a real [`Region`] over an in-memory
//! [`Archive`] and to a plain `Vec<u8>`; [`RegionHarness::verify`] checks the
//! two agree and that the segment layout is packed.

use crate::generators::EditOperation;
use seqarc_core::{Archive, BackingStore, CompressionConfig, Region};
use std::ops::{Bound, Range};

/// Resolves a range the way regions do, for the model side.
///
/// Negative bounds count from the end, bounds are clamped to `[0, size]`,
/// and an end before the start yields an empty range at the start.
#[must_use]
pub fn model_range(start: Bound<i64>, end: Bound<i64>, size: usize) -> Range<usize> {
    let size = size as i64;
    let norm = |v: i64| if v < 0 { (v + size).max(0) } else { v.min(size) };

    let s = match start {
        Bound::Included(v) => norm(v),
        Bound::Excluded(v) => norm(v + 1),
        Bound::Unbounded => 0,
    };
    let e = match end {
        Bound::Included(v) => (norm(v) + 1).min(size),
        Bound::Excluded(v) => norm(v),
        Bound::Unbounded => size,
    };

    s as usize..e.max(s) as usize
}

/// A region paired with a reference model.
pub struct RegionHarness {
    /// Region under test.
    pub region: Region,
    /// Store backing the region.
    pub store: Archive,
    /// Expected content.
    pub model: Vec<u8>,
}

impl RegionHarness {
    /// Creates a harness holding `content`.
    pub fn new(name: &str, capacity: usize, content: &[u8]) -> Self {
        Self {
            region: Region::from_content(None, name, capacity, content)
                .expect("Failed to create region"),
            store: Archive::in_memory(),
            model: content.to_vec(),
        }
    }

    /// Applies one edit to both sides.
    pub fn apply(&mut self, op: &EditOperation) {
        let store = &mut self.store;
        match op {
            EditOperation::Write { data, start, end } => {
                let end = end.map_or(Bound::Unbounded, Bound::Excluded);
                let range = (Bound::Included(*start), end);
                self.region
                    .write(store, data, range)
                    .expect("write failed");
                let local = model_range(range.0, range.1, self.model.len());
                self.model.splice(local, data.iter().copied());
            }
            EditOperation::Append { data } => {
                self.region.append(store, data).expect("append failed");
                self.model.extend_from_slice(data);
            }
            EditOperation::Prepend { data } => {
                self.region.prepend(store, data).expect("prepend failed");
                self.model.splice(0..0, data.iter().copied());
            }
            EditOperation::Clear { start, end } => {
                self.region
                    .clear(store, *start..*end)
                    .expect("clear failed");
                let local = model_range(
                    Bound::Included(*start),
                    Bound::Excluded(*end),
                    self.model.len(),
                );
                self.model.drain(local);
            }
            EditOperation::SetCapacity { capacity } => {
                self.region
                    .set_capacity(store, *capacity)
                    .expect("set_capacity failed");
            }
            EditOperation::Persist => {
                self.region
                    .persist_all(store, &CompressionConfig::default())
                    .expect("persist failed");
            }
        }
    }

    /// Checks content, size and layout against the model.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first mismatch.
    pub fn verify(&self) {
        let content = self.region.read_all(&self.store).expect("read failed");
        assert_eq!(content, self.model, "region content diverged from model");
        assert_eq!(self.region.size(), self.model.len(), "size mismatch");

        let sizes = self.region.segment_sizes();
        let capacity = self.region.capacity();
        if let Some((last, rest)) = sizes.split_last() {
            assert!(
                rest.iter().all(|&s| s == capacity),
                "non-final segment not full: {sizes:?} (capacity {capacity})"
            );
            assert!(*last > 0, "trailing empty segment: {sizes:?}");
        }

        let mut stored: Vec<&str> = self
            .region
            .segments()
            .iter()
            .filter(|s| s.has_entry())
            .map(|s| s.key())
            .collect();
        stored.sort_unstable();
        let live = self.store.keys();
        assert_eq!(
            stored, live,
            "archive entries do not match segments holding entries"
        );
        assert!(self
            .region
            .segments()
            .iter()
            .filter(|s| !s.is_resident())
            .all(|s| s.has_entry()));
    }
}
