//! Named, editable sequences split into fixed-capacity segments.
//!
//! A region owns an ordered list of [`Segment`]s covering consecutive,
//! non-overlapping ranges of its content. After every completed mutation all
//! segments except the last are full; the splice in [`Region::write`]
//! rebalances overflow and shrinkage to keep it that way.
//!
//! Segment keys are `<name>_seg_<n>` with `n` drawn from a counter that only
//! grows, so a fresh segment can never collide with a stale archive entry.

mod range;

use crate::archive::BackingStore;
use crate::compression::CompressionConfig;
use crate::error::{validate_capacity, CoreError, CoreResult};
use crate::segment::Segment;
use range::{covered_segments, local_range, resolve_range};
use std::ops::{Range, RangeBounds};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One named sequence.
#[derive(Debug, Clone)]
pub struct Region {
    name: String,
    capacity: usize,
    path: Option<PathBuf>,
    segments: Vec<Segment>,
    next_index: u64,
}

impl Region {
    /// Creates an empty region.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidCapacity`] if `capacity` is zero.
    pub fn new(
        path: Option<PathBuf>,
        name: impl Into<String>,
        capacity: usize,
    ) -> CoreResult<Self> {
        Ok(Self {
            name: name.into(),
            capacity: validate_capacity(capacity)?,
            path,
            segments: Vec::new(),
            next_index: 0,
        })
    }

    /// Creates a region holding `content`, chunked into resident segments.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidCapacity`] if `capacity` is zero.
    pub fn from_content(
        path: Option<PathBuf>,
        name: impl Into<String>,
        capacity: usize,
        content: &[u8],
    ) -> CoreResult<Self> {
        let mut region = Self::new(path, name, capacity)?;
        region.push_new_segments(content);
        Ok(region)
    }

    /// Reassembles a region from stored parts, checking the segment layout.
    pub(crate) fn from_parts(
        path: Option<PathBuf>,
        name: String,
        capacity: usize,
        next_index: u64,
        segments: Vec<Segment>,
    ) -> CoreResult<Self> {
        let capacity = validate_capacity(capacity)?;
        let region = Self {
            name,
            capacity,
            path,
            segments,
            next_index,
        };

        if !region.is_packed() || region.segments.iter().any(|s| s.max_size() != capacity) {
            return Err(CoreError::invalid_format(format!(
                "region {} has segment sizes {:?} for capacity {capacity}",
                region.name,
                region.segment_sizes()
            )));
        }
        Ok(region)
    }

    /// Region name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Units per segment.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Archive the region is bound to.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Size of each segment in order.
    #[must_use]
    pub fn segment_sizes(&self) -> Vec<usize> {
        self.segments.iter().map(Segment::size).collect()
    }

    /// The segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments currently held in memory.
    #[must_use]
    pub fn resident_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_resident()).count()
    }

    /// Counter the next segment key is drawn from.
    pub(crate) fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Total number of units.
    #[must_use]
    pub fn size(&self) -> usize {
        self.segments.iter().map(Segment::size).sum()
    }

    /// Returns whether the region holds no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Every segment but the last is full.
    fn is_packed(&self) -> bool {
        match self.segments.split_last() {
            Some((last, rest)) => {
                last.size() <= self.capacity && rest.iter().all(|s| s.size() == self.capacity)
            }
            None => true,
        }
    }

    fn next_key(&mut self) -> String {
        let key = format!("{}_seg_{}", self.name, self.next_index);
        self.next_index += 1;
        key
    }

    fn push_new_segments(&mut self, content: &[u8]) {
        for chunk in content.chunks(self.capacity) {
            let key = self.next_key();
            self.segments
                .push(Segment::new(key, self.capacity, chunk.to_vec()));
        }
    }

    /// Reads `range` of the region.
    ///
    /// Negative bounds count from the end; out-of-range bounds are clamped.
    pub fn read<R: RangeBounds<i64>>(
        &self,
        store: &dyn BackingStore,
        range: R,
    ) -> CoreResult<Vec<u8>> {
        let range = resolve_range(&range, self.size());
        self.read_resolved(store, &range)
    }

    /// Reads the whole region.
    pub fn read_all(&self, store: &dyn BackingStore) -> CoreResult<Vec<u8>> {
        self.read(store, ..)
    }

    fn read_resolved(&self, store: &dyn BackingStore, range: &Range<usize>) -> CoreResult<Vec<u8>> {
        let mut out = Vec::with_capacity(range.len());
        if range.is_empty() {
            return Ok(out);
        }

        let (first, last) = covered_segments(range, self.capacity, self.segments.len());
        for (i, seg) in self.segments.iter().enumerate().take(last + 1).skip(first) {
            let local = local_range(range, i * self.capacity, seg.size());
            out.extend(seg.read(store, local)?);
        }
        Ok(out)
    }

    /// Replaces `range` with `new`.
    ///
    /// Every segment the edit can touch is materialized before any is
    /// modified, so a store failure leaves the region and the store
    /// unchanged.
    pub fn write<R: RangeBounds<i64>>(
        &mut self,
        store: &mut dyn BackingStore,
        new: &[u8],
        range: R,
    ) -> CoreResult<()> {
        let range = resolve_range(&range, self.size());
        if new.is_empty() && range.is_empty() {
            return Ok(());
        }
        if self.segments.is_empty() {
            self.push_new_segments(new);
            return Ok(());
        }

        let cap = self.capacity;
        let count = self.segments.len();
        let (first, last) = covered_segments(&range, cap, count);
        let resizes = new.len() != range.len();

        let touched_end = if resizes { count } else { last + 1 };
        for seg in &mut self.segments[first..touched_end] {
            seg.materialize(&*store)?;
        }

        let mut remaining = new.to_vec();
        for i in first..=last {
            let local = local_range(&range, i * cap, self.segments[i].size());
            remaining = self.segments[i].write(store, &remaining, local)?;
        }

        if !remaining.is_empty() {
            for seg in &mut self.segments[last + 1..] {
                if remaining.is_empty() {
                    break;
                }
                remaining = seg.prepend(store, &remaining)?;
            }
            if !remaining.is_empty() {
                debug!(
                    region = %self.name,
                    units = remaining.len(),
                    "allocating segments for overflow"
                );
                self.push_new_segments(&remaining);
            }
        } else if new.len() < range.len() {
            let anchor = ((range.start + new.len()) / cap).min(count - 1);
            self.repack(store, anchor)?;
        }

        debug_assert!(self.is_packed(), "segments {:?}", self.segment_sizes());
        Ok(())
    }

    /// Pulls everything after segment `anchor` forward into it, cascades the
    /// overflow through the following segments, then drops empty segments
    /// from the tail.
    fn repack(&mut self, store: &mut dyn BackingStore, anchor: usize) -> CoreResult<()> {
        let mut tail = Vec::new();
        for seg in &self.segments[anchor + 1..] {
            tail.extend(seg.read(&*store, 0..seg.size())?);
        }

        let mut overflow = self.segments[anchor].append(store, &tail)?;
        for seg in &mut self.segments[anchor + 1..] {
            let size = seg.size();
            overflow = seg.write(store, &overflow, 0..size)?;
        }
        debug_assert!(overflow.is_empty());

        let before = self.segments.len();
        while let Some(seg) = self.segments.last_mut() {
            if seg.size() > 0 {
                break;
            }
            seg.purge(store)?;
            self.segments.pop();
        }

        debug!(
            region = %self.name,
            anchor,
            pruned = before - self.segments.len(),
            "repacked segments"
        );
        Ok(())
    }

    /// Appends `seq` at the end.
    pub fn append(&mut self, store: &mut dyn BackingStore, seq: &[u8]) -> CoreResult<()> {
        let size = i64::try_from(self.size()).unwrap_or(i64::MAX);
        self.write(store, seq, size..size)
    }

    /// Inserts `seq` at the start.
    pub fn prepend(&mut self, store: &mut dyn BackingStore, seq: &[u8]) -> CoreResult<()> {
        self.write(store, seq, 0..0)
    }

    /// Removes `range`.
    pub fn clear<R: RangeBounds<i64>>(
        &mut self,
        store: &mut dyn BackingStore,
        range: R,
    ) -> CoreResult<()> {
        self.write(store, &[], range)
    }

    /// Re-chunks the whole region with a new segment capacity.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidCapacity`] if `capacity` is zero; the region is
    /// left unchanged.
    pub fn set_capacity(&mut self, store: &mut dyn BackingStore, capacity: usize) -> CoreResult<()> {
        let capacity = validate_capacity(capacity)?;
        if capacity == self.capacity {
            return Ok(());
        }

        let content = self.read_all(&*store)?;
        self.delete_all(store)?;
        self.capacity = capacity;
        self.push_new_segments(&content);

        debug!(
            region = %self.name,
            capacity,
            segments = self.segments.len(),
            "re-chunked region"
        );
        Ok(())
    }

    fn segment_position(&self, index: i64) -> CoreResult<usize> {
        let count = self.segments.len();
        let not_found = || CoreError::SegmentNotFound { index, count };

        let position = if index < 0 {
            let back = usize::try_from(index.unsigned_abs()).map_err(|_| not_found())?;
            count.checked_sub(back).ok_or_else(not_found)?
        } else {
            usize::try_from(index).map_err(|_| not_found())?
        };

        if position >= count {
            return Err(not_found());
        }
        Ok(position)
    }

    /// Deletes the segment at `index` (negative counts from the end).
    pub fn delete_segment(&mut self, store: &mut dyn BackingStore, index: i64) -> CoreResult<()> {
        self.delete_segments(store, &[index])
    }

    /// Deletes several segments at once.
    ///
    /// Every index is checked before anything is deleted; duplicates are
    /// ignored. Content following an interior deletion is packed forward so
    /// that all segments but the last stay full.
    ///
    /// # Errors
    ///
    /// [`CoreError::SegmentNotFound`] for the first index out of range.
    pub fn delete_segments(
        &mut self,
        store: &mut dyn BackingStore,
        indices: &[i64],
    ) -> CoreResult<()> {
        let mut positions = indices
            .iter()
            .map(|&index| self.segment_position(index))
            .collect::<CoreResult<Vec<_>>>()?;
        positions.sort_unstable();
        positions.dedup();

        for &position in positions.iter().rev() {
            self.segments[position].purge(store)?;
            self.segments.remove(position);
        }

        if let Some(&lowest) = positions.first() {
            if lowest < self.segments.len() {
                self.repack(store, lowest.saturating_sub(1))?;
            }
        }

        debug!(region = %self.name, deleted = positions.len(), "deleted segments");
        Ok(())
    }

    /// Purges every segment and empties the region.
    pub fn delete_all(&mut self, store: &mut dyn BackingStore) -> CoreResult<()> {
        while let Some(seg) = self.segments.last_mut() {
            seg.purge(store)?;
            self.segments.pop();
        }
        Ok(())
    }

    /// Detaches every segment from `store` and binds the region to
    /// `new_path`. Does nothing if the path is unchanged.
    pub fn relocate(&mut self, store: &dyn BackingStore, new_path: &Path) -> CoreResult<()> {
        if self.path.as_deref() == Some(new_path) {
            return Ok(());
        }

        self.materialize_all(store)?;
        for seg in &mut self.segments {
            seg.relocate(store)?;
        }
        self.path = Some(new_path.to_path_buf());
        Ok(())
    }

    /// Binds the region to `path` without touching its segments.
    pub fn rebind(&mut self, path: Option<PathBuf>) {
        self.path = path;
    }

    /// Persists every resident segment.
    pub fn persist_all(
        &mut self,
        store: &mut dyn BackingStore,
        compression: &CompressionConfig,
    ) -> CoreResult<()> {
        for seg in &mut self.segments {
            seg.persist(store, compression)?;
        }
        Ok(())
    }

    /// Materializes every archived segment.
    pub fn materialize_all(&mut self, store: &dyn BackingStore) -> CoreResult<()> {
        for seg in &mut self.segments {
            seg.materialize(store)?;
        }
        Ok(())
    }
}
