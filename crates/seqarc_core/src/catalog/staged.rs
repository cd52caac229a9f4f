//! Purges held back until the catalog is saved.
//!
//! The head record on disk names the segment keys of the last save. Purging
//! one of those keys before a new head is written would leave the saved
//! catalog unreadable, so catalog edits run against a [`StagedStore`] that
//! only records purges. [`Catalog::save`](super::Catalog::save) applies them
//! once the new head is down.

use crate::archive::{Archive, BackingStore};
use crate::error::{CoreError, CoreResult};
use std::collections::BTreeSet;

/// A view of the archive that defers purges of live keys.
pub(crate) struct StagedStore<'a> {
    archive: &'a mut Archive,
    retired: &'a mut BTreeSet<String>,
}

impl<'a> StagedStore<'a> {
    pub(crate) fn new(archive: &'a mut Archive, retired: &'a mut BTreeSet<String>) -> Self {
        Self { archive, retired }
    }
}

impl BackingStore for StagedStore<'_> {
    fn extract(&self, key: &str) -> CoreResult<Vec<u8>> {
        if self.retired.contains(key) {
            return Err(CoreError::entry_not_found(key));
        }
        self.archive.extract(key)
    }

    fn append(&mut self, key: &str, data: &[u8]) -> CoreResult<()> {
        // Re-appending a retired key supersedes the old entry right away.
        if self.retired.remove(key) {
            self.archive.purge(key)?;
        }
        self.archive.append(key, data)
    }

    fn purge(&mut self, key: &str) -> CoreResult<()> {
        if self.archive.contains(key) {
            self.retired.insert(key.to_string());
        }
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        !self.retired.contains(key) && self.archive.contains(key)
    }

    fn keys(&self) -> Vec<String> {
        self.archive
            .keys()
            .into_iter()
            .filter(|key| !self.retired.contains(key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_is_recorded_not_applied() {
        let mut archive = Archive::in_memory();
        archive.append("chr1_seg_0", b"ACGT").unwrap();
        let mut retired = BTreeSet::new();

        let mut store = StagedStore::new(&mut archive, &mut retired);
        store.purge("chr1_seg_0").unwrap();
        store.purge("never_written").unwrap();
        assert!(!store.contains("chr1_seg_0"));
        assert!(store.keys().is_empty());
        assert!(matches!(
            store.extract("chr1_seg_0"),
            Err(CoreError::EntryNotFound { .. })
        ));

        assert_eq!(retired.len(), 1);
        assert_eq!(archive.extract("chr1_seg_0").unwrap(), b"ACGT");
    }

    #[test]
    fn append_replaces_retired_key() {
        let mut archive = Archive::in_memory();
        archive.append("chr1_seg_0", b"old").unwrap();
        let mut retired = BTreeSet::new();

        let mut store = StagedStore::new(&mut archive, &mut retired);
        store.purge("chr1_seg_0").unwrap();
        store.append("chr1_seg_0", b"new").unwrap();
        assert!(store.contains("chr1_seg_0"));

        assert!(retired.is_empty());
        assert_eq!(archive.extract("chr1_seg_0").unwrap(), b"new");
    }
}
