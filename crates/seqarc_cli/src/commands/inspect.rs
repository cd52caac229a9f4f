//! Inspect command implementation.

use super::{open_existing, CliError};
use seqarc_core::{Catalog, Region};
use serde::Serialize;
use std::path::Path;

/// Catalog inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Archive path.
    pub path: String,
    /// Capacity given to new regions.
    pub default_capacity: usize,
    /// Archive file size in bytes.
    pub total_size: u64,
    /// Number of live archive entries (segments plus the head record).
    pub live_entries: usize,
    /// Records in the log, live or not.
    pub record_count: usize,
    /// Tombstone records in the log.
    pub tombstone_count: usize,
    /// Bytes a compaction would reclaim.
    pub dead_bytes: u64,
    /// Per-region details.
    pub regions: Vec<RegionInfo>,
}

/// Details for a single region.
#[derive(Debug, Serialize)]
pub struct RegionInfo {
    /// Region name.
    pub name: String,
    /// Total units.
    pub size: usize,
    /// Units per segment.
    pub capacity: usize,
    /// Number of segments.
    pub segment_count: usize,
    /// Segment sizes (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_sizes: Option<Vec<usize>>,
}

impl RegionInfo {
    fn new(region: &Region, show_segments: bool) -> Self {
        Self {
            name: region.name().to_string(),
            size: region.size(),
            capacity: region.capacity(),
            segment_count: region.segment_count(),
            segment_sizes: show_segments.then(|| region.segment_sizes()),
        }
    }
}

/// Builds the inspection result for an open catalog.
pub fn inspect(
    path: &Path,
    catalog: &Catalog,
    show_segments: bool,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let stats = catalog.archive().stats()?;

    let regions = catalog
        .region_names()
        .into_iter()
        .filter_map(|name| catalog.region(name))
        .map(|region| RegionInfo::new(region, show_segments))
        .collect();

    Ok(InspectResult {
        path: path.display().to_string(),
        default_capacity: catalog.default_capacity(),
        total_size: stats.total_bytes,
        live_entries: stats.live_entries,
        record_count: stats.records,
        tombstone_count: stats.tombstones,
        dead_bytes: stats.dead_bytes,
        regions,
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, show_segments: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !matches!(format, "text" | "json") {
        return Err(CliError::UnknownFormat(format.to_string()).into());
    }

    let catalog = open_existing(path)?;
    let result = inspect(path, &catalog, show_segments)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("SeqArc Archive: {}", result.path);
    println!();
    println!("Archive:");
    println!("  Size:           {} bytes", result.total_size);
    println!("  Live entries:   {}", result.live_entries);
    println!("  Records:        {}", result.record_count);
    println!("  Tombstones:     {}", result.tombstone_count);
    println!("  Reclaimable:    {} bytes", result.dead_bytes);
    println!();
    println!(
        "Regions ({}, default capacity {}):",
        result.regions.len(),
        result.default_capacity
    );

    for region in &result.regions {
        println!(
            "  {:<20} {:>12} units  capacity {:<8} {} segments",
            region.name, region.size, region.capacity, region.segment_count
        );
        if let Some(sizes) = &region.segment_sizes {
            for (i, size) in sizes.iter().enumerate() {
                println!("    [{i}] {size}");
            }
        }
    }
}
