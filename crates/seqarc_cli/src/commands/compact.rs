//! Compact command implementation.

use super::open_existing;
use seqarc_core::{ArchiveStats, ARCHIVE_HEADER_SIZE};
use std::path::Path;

/// Projected effect of a compaction, computed without touching the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactPlan {
    /// Records in the log now.
    pub input_records: usize,
    /// Records left after compaction.
    pub output_records: usize,
    /// Log size now.
    pub bytes_before: u64,
    /// Log size after compaction.
    pub bytes_after: u64,
}

impl CompactPlan {
    /// Derives the plan from archive statistics.
    #[must_use]
    pub fn from_stats(stats: &ArchiveStats) -> Self {
        Self {
            input_records: stats.records,
            output_records: stats.live_entries,
            bytes_before: stats.total_bytes,
            bytes_after: ARCHIVE_HEADER_SIZE + stats.live_bytes,
        }
    }

    fn saved(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// Runs the compact command.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("Compacting archive at {}", path.display());
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();

    let mut catalog = open_existing(path)?;
    let plan = CompactPlan::from_stats(&catalog.archive().stats()?);

    println!("Compaction Analysis:");
    println!("  Input records:     {}", plan.input_records);
    println!("  Output records:    {}", plan.output_records);
    println!();
    println!("  Size before: {} bytes", plan.bytes_before);
    println!("  Size after:  {} bytes", plan.bytes_after);
    println!(
        "  Space saved: {} bytes ({:.1}%)",
        plan.saved(),
        if plan.bytes_before > 0 {
            (plan.saved() as f64 / plan.bytes_before as f64) * 100.0
        } else {
            0.0
        }
    );

    if !dry_run {
        println!();
        if plan.output_records < plan.input_records {
            println!("Performing compaction...");
            let stats = catalog.compact()?;
            println!("✓ Compaction complete ({} bytes reclaimed)", stats.bytes_saved());
        } else {
            println!("No compaction needed - archive is already optimal");
        }
    }

    Ok(())
}
