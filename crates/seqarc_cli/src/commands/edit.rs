//! Commands that modify regions.
//!
//! Each command opens the catalog, applies one edit and saves.

use super::{bounds, compression, open_for_edit};
use seqarc_core::CompressionConfig;
use std::path::Path;
use tracing::info;

/// Runs the put command.
pub fn put(
    path: &Path,
    region: &str,
    content: &[u8],
    start: Option<i64>,
    end: Option<i64>,
    method: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut catalog = open_for_edit(path, compression(method)?)?;
    catalog.write(region, content, bounds(start, end))?;
    catalog.save()?;

    info!(region, units = content.len(), "wrote region");
    println!(
        "{region}: {} units",
        catalog.region(region).map_or(0, |r| r.size())
    );
    Ok(())
}

/// Runs the append command.
pub fn append(
    path: &Path,
    region: &str,
    content: &[u8],
    method: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut catalog = open_for_edit(path, compression(method)?)?;
    catalog.append(region, content)?;
    catalog.save()?;

    println!(
        "{region}: {} units",
        catalog.region(region).map_or(0, |r| r.size())
    );
    Ok(())
}

/// Runs the delete-region command.
pub fn delete_region(path: &Path, region: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut catalog = open_for_edit(path, CompressionConfig::default())?;
    catalog.delete_region(region)?;
    catalog.save()?;

    println!("Deleted region {region}");
    Ok(())
}

/// Runs the set-capacity command.
pub fn set_capacity(
    path: &Path,
    region: &str,
    capacity: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut catalog = open_for_edit(path, CompressionConfig::default())?;
    catalog.set_region_capacity(region, capacity)?;
    catalog.save()?;

    let segments = catalog.region(region).map_or(0, |r| r.segment_count());
    println!("{region}: capacity {capacity}, {segments} segments");
    Ok(())
}
