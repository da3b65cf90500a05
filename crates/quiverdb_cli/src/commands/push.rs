//! `push` command: append a value, refusing duplicates.

use super::{open_engine, print_node};
use std::path::Path;

/// Runs the push command.
pub fn run(data_dir: &Path, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(data_dir)?;

    let node = engine.tx(|tx| tx.add_unique_value(key, value.as_bytes().to_vec()))?;
    print_node(&node);

    engine.close()?;
    Ok(())
}
