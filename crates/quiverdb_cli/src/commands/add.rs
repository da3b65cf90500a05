//! `add` command: append a value, duplicates allowed.

use super::{open_engine, print_node};
use std::path::Path;

/// Runs the add command.
pub fn run(data_dir: &Path, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(data_dir)?;

    let node = engine.tx(|tx| tx.add_value(key, value.as_bytes().to_vec()))?;
    print_node(&node);

    engine.close()?;
    Ok(())
}
