//! `rm` command: remove a key entirely.

use super::open_engine;
use std::path::Path;

/// Runs the rm command.
pub fn run(data_dir: &Path, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(data_dir)?;

    engine.tx(|tx| tx.remove_key(key))?;
    println!("removed \"{key}\"");

    engine.close()?;
    Ok(())
}
