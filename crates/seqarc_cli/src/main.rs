//! SeqArc CLI
//!
//! Command-line tools for SeqArc archives.
//!
//! # Commands
//!
//! - `inspect` - Display regions, segment layout and archive statistics
//! - `cat` - Print a region (or a slice of it)
//! - `put` - Replace a slice of a region, creating the region if needed
//! - `append` - Append to a region
//! - `delete-region` - Remove a region and its segments
//! - `set-capacity` - Re-chunk a region
//! - `compact` - Rewrite the archive without dead records

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SeqArc command-line archive tools.
#[derive(Parser)]
#[command(name = "seqarc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the archive file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display regions, segment layout and archive statistics
    Inspect {
        /// Show per-segment sizes and residency
        #[arg(short, long)]
        segments: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print a region to stdout
    Cat {
        /// Region name
        region: String,

        /// First unit (negative counts from the end)
        #[arg(long, allow_negative_numbers = true)]
        start: Option<i64>,

        /// End unit, exclusive (negative counts from the end)
        #[arg(long, allow_negative_numbers = true)]
        end: Option<i64>,
    },

    /// Replace a slice of a region (the whole region by default)
    Put {
        /// Region name
        region: String,

        /// Content given inline
        #[arg(short, long, conflicts_with = "file")]
        data: Option<String>,

        /// Read content from a file
        #[arg(long)]
        file: Option<PathBuf>,

        /// First unit replaced (negative counts from the end)
        #[arg(long, allow_negative_numbers = true)]
        start: Option<i64>,

        /// End of the replaced slice, exclusive
        #[arg(long, allow_negative_numbers = true)]
        end: Option<i64>,

        /// Compression for written segments (none, lz4, zstd)
        #[arg(short, long, default_value = "lz4")]
        compression: String,
    },

    /// Append to a region, creating it if needed
    Append {
        /// Region name
        region: String,

        /// Content given inline
        #[arg(short, long, conflicts_with = "file")]
        data: Option<String>,

        /// Read content from a file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Compression for written segments (none, lz4, zstd)
        #[arg(short, long, default_value = "lz4")]
        compression: String,
    },

    /// Delete a region and purge its segments
    DeleteRegion {
        /// Region name
        region: String,
    },

    /// Re-chunk a region with a new segment capacity
    SetCapacity {
        /// Region name
        region: String,

        /// Units per segment
        capacity: usize,
    },

    /// Rewrite the archive keeping only live records
    Compact {
        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so `cat` output stays clean.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { segments, format } => {
            let path = commands::require_path(cli.path, "inspect")?;
            commands::inspect::run(&path, segments, &format)?;
        }
        Commands::Cat { region, start, end } => {
            let path = commands::require_path(cli.path, "cat")?;
            commands::cat::run(&path, &region, start, end)?;
        }
        Commands::Put {
            region,
            data,
            file,
            start,
            end,
            compression,
        } => {
            let path = commands::require_path(cli.path, "put")?;
            let content = commands::input(data, file)?;
            commands::edit::put(&path, &region, &content, start, end, &compression)?;
        }
        Commands::Append {
            region,
            data,
            file,
            compression,
        } => {
            let path = commands::require_path(cli.path, "append")?;
            let content = commands::input(data, file)?;
            commands::edit::append(&path, &region, &content, &compression)?;
        }
        Commands::DeleteRegion { region } => {
            let path = commands::require_path(cli.path, "delete-region")?;
            commands::edit::delete_region(&path, &region)?;
        }
        Commands::SetCapacity { region, capacity } => {
            let path = commands::require_path(cli.path, "set-capacity")?;
            commands::edit::set_capacity(&path, &region, capacity)?;
        }
        Commands::Compact { dry_run } => {
            let path = commands::require_path(cli.path, "compact")?;
            commands::compact::run(&path, dry_run)?;
        }
        Commands::Version => {
            println!("SeqArc CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("SeqArc Core v{}", seqarc_core::VERSION);
        }
    }

    Ok(())
}
