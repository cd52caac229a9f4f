//! Named regions stored together in one archive.
//!
//! The catalog maps region names to [`Region`]s and persists its layout as a
//! head record under [`HEAD_KEY`] in the same archive as the segments. All
//! sequence work is delegated to the regions.
//!
//! Until [`Catalog::save`] runs, the archive still describes the previous
//! save: edits may add nothing to it and purge nothing from it. Dropping a
//! catalog without saving therefore loses only the unsaved edits.
//!
//! # Example
//!
//! ```rust,ignore
//! use seqarc_core::{Catalog, Config};
//!
//! let mut catalog = Catalog::open_or_create(path, &Config::default())?;
//! catalog.create_region("chr1", b"ACGTACGT")?;
//! catalog.write("chr1", b"TT", 2..4)?;
//! catalog.save()?;
//! ```

mod snapshot;
mod staged;

pub use snapshot::{CatalogSnapshot, RegionSnapshot, SegmentSnapshot, HEAD_MAGIC, HEAD_VERSION};

use crate::archive::lock::lock_path;
use crate::archive::{Archive, BackingStore, CompactionStats};
use crate::config::Config;
use crate::error::{validate_capacity, CoreError, CoreResult};
use crate::region::Region;
use staged::StagedStore;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeBounds;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Archive key of the head record.
pub const HEAD_KEY: &str = "head";

/// A set of named regions backed by one archive.
#[derive(Debug)]
pub struct Catalog {
    archive: Archive,
    path: Option<PathBuf>,
    config: Config,
    default_capacity: usize,
    regions: BTreeMap<String, Region>,
    /// Keys to purge once the next head record is written.
    retired: BTreeSet<String>,
    saved: bool,
}

impl Catalog {
    /// Creates a new catalog in the archive at `path`.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidOperation`] if the archive already holds a catalog.
    pub fn create(path: &Path, config: &Config) -> CoreResult<Self> {
        let archive = Archive::open(path, config)?;
        if archive.contains(HEAD_KEY) {
            return Err(CoreError::invalid_operation(format!(
                "archive {} already holds a catalog",
                path.display()
            )));
        }

        let catalog = Self::fresh(archive, Some(path.to_path_buf()), config)?;
        info!(path = %path.display(), "created catalog");
        Ok(catalog)
    }

    /// Opens the catalog stored in the archive at `path`.
    ///
    /// Every region is bound to `path`, whatever path was recorded when the
    /// catalog was saved. A missing file is never created.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ArchiveNotFound`] if there is no file at `path`
    /// - [`CoreError::CatalogNotFound`] if the archive holds no head record
    pub fn open(path: &Path, config: &Config) -> CoreResult<Self> {
        let archive = Archive::open(path, &config.create_if_missing(false))?;
        if !archive.contains(HEAD_KEY) {
            return Err(CoreError::CatalogNotFound {
                path: path.to_path_buf(),
            });
        }

        let catalog = Self::load(archive, Some(path.to_path_buf()), config)?;
        info!(
            path = %path.display(),
            regions = catalog.regions.len(),
            "opened catalog"
        );
        Ok(catalog)
    }

    /// Opens the catalog at `path`, creating one if the archive holds none.
    pub fn open_or_create(path: &Path, config: &Config) -> CoreResult<Self> {
        let archive = Archive::open(path, config)?;
        if archive.contains(HEAD_KEY) {
            Self::load(archive, Some(path.to_path_buf()), config)
        } else {
            Self::fresh(archive, Some(path.to_path_buf()), config)
        }
    }

    /// Creates a catalog backed by an in-memory archive.
    pub fn in_memory(config: &Config) -> CoreResult<Self> {
        Self::fresh(Archive::in_memory(), None, config)
    }

    fn fresh(archive: Archive, path: Option<PathBuf>, config: &Config) -> CoreResult<Self> {
        Ok(Self {
            archive,
            path,
            config: *config,
            default_capacity: validate_capacity(config.default_capacity)?,
            regions: BTreeMap::new(),
            retired: BTreeSet::new(),
            saved: false,
        })
    }

    fn load(archive: Archive, path: Option<PathBuf>, config: &Config) -> CoreResult<Self> {
        let head = archive.extract(HEAD_KEY)?;
        let snapshot = CatalogSnapshot::decode(&head)?;

        let mut regions = BTreeMap::new();
        for region in snapshot.regions {
            let region = region.restore(path.clone())?;
            regions.insert(region.name().to_string(), region);
        }

        Ok(Self {
            archive,
            path,
            config: *config,
            default_capacity: validate_capacity(snapshot.default_capacity)?,
            regions,
            retired: BTreeSet::new(),
            saved: true,
        })
    }

    /// Path of the backing archive, `None` when in memory.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The backing archive.
    #[must_use]
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Capacity given to newly created regions.
    #[must_use]
    pub fn default_capacity(&self) -> usize {
        self.default_capacity
    }

    /// Returns whether every change has been saved.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Region names in sorted order.
    #[must_use]
    pub fn region_names(&self) -> Vec<&str> {
        self.regions.keys().map(String::as_str).collect()
    }

    /// Size of every region, by name.
    #[must_use]
    pub fn region_sizes(&self) -> BTreeMap<&str, usize> {
        self.regions
            .iter()
            .map(|(name, region)| (name.as_str(), region.size()))
            .collect()
    }

    /// Looks up a region.
    #[must_use]
    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    /// Returns whether a region exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns whether the catalog holds no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Sets the default capacity and re-chunks every region to it.
    pub fn set_default_capacity(&mut self, capacity: usize) -> CoreResult<()> {
        let capacity = validate_capacity(capacity)?;
        let mut store = StagedStore::new(&mut self.archive, &mut self.retired);
        for region in self.regions.values_mut() {
            region.set_capacity(&mut store, capacity)?;
        }
        self.default_capacity = capacity;
        self.saved = false;
        Ok(())
    }

    /// Creates a region holding `content`.
    ///
    /// # Errors
    ///
    /// [`CoreError::RegionExists`] if the name is taken.
    pub fn create_region(&mut self, name: &str, content: &[u8]) -> CoreResult<()> {
        if self.regions.contains_key(name) {
            return Err(CoreError::region_exists(name));
        }
        self.insert_region(name, content)
    }

    fn insert_region(&mut self, name: &str, content: &[u8]) -> CoreResult<()> {
        let region = Region::from_content(self.path.clone(), name, self.default_capacity, content)?;
        debug!(
            region = name,
            size = region.size(),
            segments = region.segment_count(),
            "created region"
        );
        self.regions.insert(name.to_string(), region);
        self.saved = false;
        Ok(())
    }

    /// Creates or overwrites a region.
    pub fn replace_region(&mut self, name: &str, content: &[u8]) -> CoreResult<()> {
        if self.regions.contains_key(name) {
            self.delete_region(name)?;
        }
        self.insert_region(name, content)
    }

    /// Creates `dst` holding a copy of `src`.
    pub fn copy_region(&mut self, src: &str, dst: &str) -> CoreResult<()> {
        if self.regions.contains_key(dst) {
            return Err(CoreError::region_exists(dst));
        }
        let content = self.read(src, ..)?;
        self.insert_region(dst, &content)
    }

    /// Deletes a region. Its segments are purged by the next save.
    pub fn delete_region(&mut self, name: &str) -> CoreResult<()> {
        let region = self
            .regions
            .get_mut(name)
            .ok_or_else(|| CoreError::region_not_found(name))?;
        region.delete_all(&mut StagedStore::new(&mut self.archive, &mut self.retired))?;
        self.regions.remove(name);
        self.saved = false;

        debug!(region = name, "deleted region");
        Ok(())
    }

    /// Reads `range` of a region.
    pub fn read<R: RangeBounds<i64>>(&self, name: &str, range: R) -> CoreResult<Vec<u8>> {
        self.regions
            .get(name)
            .ok_or_else(|| CoreError::region_not_found(name))?
            .read(&self.archive, range)
    }

    /// Replaces `range` of a region with `new`, creating the region from
    /// `new` if it does not exist.
    pub fn write<R: RangeBounds<i64>>(
        &mut self,
        name: &str,
        new: &[u8],
        range: R,
    ) -> CoreResult<()> {
        match self.regions.get_mut(name) {
            Some(region) => region.write(
                &mut StagedStore::new(&mut self.archive, &mut self.retired),
                new,
                range,
            )?,
            None => return self.insert_region(name, new),
        }
        self.saved = false;
        Ok(())
    }

    /// Appends to a region, creating it if needed.
    pub fn append(&mut self, name: &str, seq: &[u8]) -> CoreResult<()> {
        match self.regions.get_mut(name) {
            Some(region) => {
                region.append(&mut StagedStore::new(&mut self.archive, &mut self.retired), seq)?;
            }
            None => return self.insert_region(name, seq),
        }
        self.saved = false;
        Ok(())
    }

    /// Prepends to a region, creating it if needed.
    pub fn prepend(&mut self, name: &str, seq: &[u8]) -> CoreResult<()> {
        match self.regions.get_mut(name) {
            Some(region) => {
                region.prepend(&mut StagedStore::new(&mut self.archive, &mut self.retired), seq)?;
            }
            None => return self.insert_region(name, seq),
        }
        self.saved = false;
        Ok(())
    }

    /// Removes `range` from a region.
    pub fn clear<R: RangeBounds<i64>>(&mut self, name: &str, range: R) -> CoreResult<()> {
        let region = self
            .regions
            .get_mut(name)
            .ok_or_else(|| CoreError::region_not_found(name))?;
        region.clear(&mut StagedStore::new(&mut self.archive, &mut self.retired), range)?;
        self.saved = false;
        Ok(())
    }

    /// Segment capacity of a region.
    pub fn region_capacity(&self, name: &str) -> CoreResult<usize> {
        self.regions
            .get(name)
            .map(Region::capacity)
            .ok_or_else(|| CoreError::region_not_found(name))
    }

    /// Re-chunks one region.
    pub fn set_region_capacity(&mut self, name: &str, capacity: usize) -> CoreResult<()> {
        let region = self
            .regions
            .get_mut(name)
            .ok_or_else(|| CoreError::region_not_found(name))?;
        region.set_capacity(
            &mut StagedStore::new(&mut self.archive, &mut self.retired),
            capacity,
        )?;
        self.saved = false;
        Ok(())
    }

    /// Persists every region, writes a new head record, then purges the
    /// entries that edits since the last save have retired.
    pub fn save(&mut self) -> CoreResult<()> {
        let compression = self.config.compression;
        let mut regions = Vec::with_capacity(self.regions.len());
        let mut store = StagedStore::new(&mut self.archive, &mut self.retired);
        for region in self.regions.values_mut() {
            region.persist_all(&mut store, &compression)?;
            regions.push(RegionSnapshot::capture(region)?);
        }

        let snapshot = CatalogSnapshot {
            path: self.path.clone(),
            default_capacity: self.default_capacity,
            regions,
        };
        let head = snapshot.encode()?;

        // Not atomic: a crash between these leaves no head record.
        self.archive.purge(HEAD_KEY)?;
        self.archive.append(HEAD_KEY, &head)?;

        while let Some(key) = self.retired.first().cloned() {
            self.archive.purge(&key)?;
            self.retired.remove(&key);
        }

        if self.config.sync_on_save {
            self.archive.sync()?;
        } else {
            self.archive.flush()?;
        }
        self.saved = true;

        info!(
            regions = self.regions.len(),
            entries = self.archive.len(),
            "saved catalog"
        );
        Ok(())
    }

    /// Moves the catalog to a new archive at `new_path`.
    ///
    /// Every region is materialized from the current archive, which is then
    /// deleted. Content stays in memory until the next [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidOperation`] if the target archive already holds
    /// entries.
    pub fn relocate(&mut self, new_path: &Path) -> CoreResult<()> {
        if self.path.as_deref() == Some(new_path) {
            return Ok(());
        }

        let target = Archive::open(new_path, &self.config.create_if_missing(true))?;
        if !target.is_empty() {
            return Err(CoreError::invalid_operation(format!(
                "cannot relocate into non-empty archive {}",
                new_path.display()
            )));
        }

        for region in self.regions.values_mut() {
            region.relocate(&self.archive, new_path)?;
        }
        self.retired.clear();

        let old = std::mem::replace(&mut self.archive, target);
        drop(old);
        if let Some(old_path) = self.path.replace(new_path.to_path_buf()) {
            std::fs::remove_file(&old_path)?;
            let lock = lock_path(&old_path);
            if lock.exists() {
                std::fs::remove_file(lock)?;
            }
        }
        self.saved = false;

        info!(path = %new_path.display(), "relocated catalog");
        Ok(())
    }

    /// Compacts the backing archive.
    pub fn compact(&mut self) -> CoreResult<CompactionStats> {
        self.archive.compact()
    }
}
