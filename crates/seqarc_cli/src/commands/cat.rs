//! Cat command implementation.

use super::{bounds, open_existing};
use std::io::Write;
use std::path::Path;

/// Runs the cat command.
pub fn run(
    path: &Path,
    region: &str,
    start: Option<i64>,
    end: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = open_existing(path)?;
    let content = catalog.read(region, bounds(start, end))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&content)?;
    stdout.flush()?;
    Ok(())
}
