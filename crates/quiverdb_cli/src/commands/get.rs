//! `get` command: print one key with its values.

use super::{open_engine, print_node};
use std::path::Path;

/// Runs the get command.
pub fn run(data_dir: &Path, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(data_dir)?;

    let node = engine.tx(|tx| tx.get(key))?;
    print_node(&node);

    engine.close()?;
    Ok(())
}
