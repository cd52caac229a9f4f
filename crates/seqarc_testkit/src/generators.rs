//! Property-based test generators using proptest.
//!
//! Ranges are drawn from a window wider than the content on both sides, so
//! negative, reversed and out-of-range bounds all show up.

use proptest::prelude::*;

/// Largest offset magnitude generated for range bounds.
pub const MAX_OFFSET: i64 = 80;

/// Strategy for generating region content.
pub fn content_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"ACGT".to_vec()), 0..=max_len)
}

/// Strategy for generating segment capacities.
pub fn capacity_strategy() -> impl Strategy<Value = usize> {
    1usize..=16
}

/// Strategy for generating valid region names.
pub fn region_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9]{0,15}").expect("Invalid regex")
}

/// Strategy for generating a range bound.
pub fn offset_strategy() -> impl Strategy<Value = i64> {
    -MAX_OFFSET..=MAX_OFFSET
}

/// An edit applied to a region.
#[derive(Debug, Clone)]
pub enum EditOperation {
    /// Replace `[start, end)` with `data`
    Write {
        /// Replacement content
        data: Vec<u8>,
        /// Start bound
        start: i64,
        /// End bound (the region size when absent)
        end: Option<i64>,
    },
    /// Append `data`
    Append {
        /// Appended content
        data: Vec<u8>,
    },
    /// Prepend `data`
    Prepend {
        /// Prepended content
        data: Vec<u8>,
    },
    /// Remove `[start, end)`
    Clear {
        /// Start bound
        start: i64,
        /// End bound
        end: i64,
    },
    /// Re-chunk with a new capacity
    SetCapacity {
        /// New capacity
        capacity: usize,
    },
    /// Persist every segment
    Persist,
}

/// Strategy for generating edit operations.
pub fn edit_operation_strategy() -> impl Strategy<Value = EditOperation> {
    prop_oneof![
        4 => (content_strategy(30), offset_strategy(), prop::option::of(offset_strategy()))
            .prop_map(|(data, start, end)| EditOperation::Write { data, start, end }),
        2 => content_strategy(25).prop_map(|data| EditOperation::Append { data }),
        2 => content_strategy(25).prop_map(|data| EditOperation::Prepend { data }),
        2 => (offset_strategy(), offset_strategy())
            .prop_map(|(start, end)| EditOperation::Clear { start, end }),
        1 => capacity_strategy().prop_map(|capacity| EditOperation::SetCapacity { capacity }),
        1 => Just(EditOperation::Persist),
    ]
}

/// Strategy for generating a sequence of edits.
pub fn edit_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<EditOperation>> {
    prop::collection::vec(edit_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn content_is_nucleotides(content in content_strategy(50)) {
            prop_assert!(content.len() <= 50);
            prop_assert!(content.iter().all(|b| b"ACGT".contains(b)));
        }

        #[test]
        fn region_name_is_valid(name in region_name_strategy()) {
            let first = name.chars().next();
            prop_assert!(first.is_some_and(|c| c.is_ascii_alphabetic()));
        }

        #[test]
        fn capacities_are_positive(capacity in capacity_strategy()) {
            prop_assert!(capacity >= 1);
        }
    }
}
