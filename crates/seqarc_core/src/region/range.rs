//! Offset arithmetic for regions.
//!
//! Logical offsets are translated into segment indices and segment-local
//! ranges. A range end lying exactly on a capacity multiple belongs to the
//! preceding segment, so an insertion at a segment boundary lands at the tail
//! of the earlier segment and overflows forward.

use std::ops::{Bound, Range, RangeBounds};

/// Resolves a caller range against a sequence of `size` units.
///
/// Negative bounds count from the end. Results are clamped to `[0, size]`
/// and an end before the start collapses to an empty range at the start.
pub(crate) fn resolve_range<R: RangeBounds<i64>>(range: &R, size: usize) -> Range<usize> {
    let size_i = i64::try_from(size).unwrap_or(i64::MAX);

    let clamp = |value: i64| -> usize {
        let value = if value < 0 {
            value.saturating_add(size_i)
        } else {
            value
        };
        // In [0, size] after the clamp, so the cast is lossless.
        value.clamp(0, size_i) as usize
    };

    let start = match range.start_bound() {
        Bound::Included(&s) => clamp(s),
        Bound::Excluded(&s) => clamp(s.saturating_add(1)),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => clamp(e).saturating_add(1).min(size),
        Bound::Excluded(&e) => clamp(e),
        Bound::Unbounded => size,
    };

    start..end.max(start)
}

/// Returns the first and last segment indices covering `range`.
///
/// `count` must be non-zero.
pub(crate) fn covered_segments(range: &Range<usize>, capacity: usize, count: usize) -> (usize, usize) {
    debug_assert!(count > 0);
    let last = if range.end == 0 {
        0
    } else {
        (range.end - 1) / capacity
    }
    .min(count - 1);
    let first = (range.start / capacity).min(last);
    (first, last)
}

/// Clips a logical range to the segment starting at `base` holding `size`
/// units, returning the segment-local range.
pub(crate) fn local_range(range: &Range<usize>, base: usize, size: usize) -> Range<usize> {
    let start = range.start.saturating_sub(base).min(size);
    let end = range.end.saturating_sub(base).min(size).max(start);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ranges() {
        assert_eq!(resolve_range(&(2..5), 10), 2..5);
        assert_eq!(resolve_range(&(..), 10), 0..10);
        assert_eq!(resolve_range(&(3..), 10), 3..10);
        assert_eq!(resolve_range(&(..4), 10), 0..4);
        assert_eq!(resolve_range(&(2..=4), 10), 2..5);
    }

    #[test]
    fn negative_bounds_count_from_end() {
        assert_eq!(resolve_range(&(-3..), 10), 7..10);
        assert_eq!(resolve_range(&(..-1), 10), 0..9);
        assert_eq!(resolve_range(&(-4..-2), 10), 6..8);
        assert_eq!(resolve_range(&(-100..3), 10), 0..3);
        assert_eq!(resolve_range(&(-1..=-1), 10), 9..10);
    }

    #[test]
    fn out_of_range_bounds_clamp() {
        assert_eq!(resolve_range(&(15..20), 10), 10..10);
        assert_eq!(resolve_range(&(5..500), 10), 5..10);
        assert_eq!(resolve_range(&(0..=10), 10), 0..10);
        assert_eq!(resolve_range(&(i64::MIN..i64::MAX), 10), 0..10);
    }

    #[test]
    fn reversed_range_collapses() {
        assert_eq!(resolve_range(&(7..3), 10), 7..7);
        assert_eq!(resolve_range(&(-2..-5), 10), 8..8);
    }

    #[test]
    fn empty_sequence() {
        assert_eq!(resolve_range(&(..), 0), 0..0);
        assert_eq!(resolve_range(&(-5..5), 0), 0..0);
    }

    #[test]
    fn boundary_end_belongs_to_preceding_segment() {
        // Three segments of capacity 10.
        assert_eq!(covered_segments(&(0..10), 10, 3), (0, 0));
        assert_eq!(covered_segments(&(8..12), 10, 3), (0, 1));
        assert_eq!(covered_segments(&(10..10), 10, 3), (0, 0));
        assert_eq!(covered_segments(&(10..11), 10, 3), (1, 1));
        assert_eq!(covered_segments(&(0..0), 10, 3), (0, 0));
        assert_eq!(covered_segments(&(25..25), 10, 3), (2, 2));
        assert_eq!(covered_segments(&(30..30), 10, 3), (2, 2));
    }

    #[test]
    fn local_range_clips_to_segment() {
        assert_eq!(local_range(&(8..12), 0, 10), 8..10);
        assert_eq!(local_range(&(8..12), 10, 10), 0..2);
        assert_eq!(local_range(&(5..25), 20, 5), 0..5);
        assert_eq!(local_range(&(25..25), 20, 5), 5..5);
    }
}
