//! `set` command: replace a key's whole value list.

use super::{open_engine, print_node};
use std::path::Path;

/// Runs the set command.
pub fn run(data_dir: &Path, key: &str, values: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(data_dir)?;
    let values: Vec<Vec<u8>> = values.iter().map(|v| v.clone().into_bytes()).collect();

    let node = engine.tx(|tx| tx.set(key, &values))?;
    print_node(&node);

    engine.close()?;
    Ok(())
}
