//! `vacuum` command: one-shot log compaction.

use super::open_engine;
use std::path::Path;

/// Runs the vacuum command.
pub fn run(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(data_dir)?;

    let before = std::fs::metadata(data_dir.join("journal.dat"))?.len();
    engine.vacuum()?;
    let after = std::fs::metadata(data_dir.join("journal.dat"))?.len();
    println!("vacuum complete: journal {before} -> {after} bytes");

    engine.close()?;
    Ok(())
}
