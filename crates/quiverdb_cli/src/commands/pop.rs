//! `pop` command: remove one or all occurrences of a value.

use super::{open_engine, print_node};
use std::path::Path;

/// Runs the pop command.
pub fn run(
    data_dir: &Path,
    key: &str,
    value: &str,
    all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(data_dir)?;

    let node = engine.tx(|tx| {
        if all {
            tx.remove_all_values(key, value.as_bytes())
        } else {
            tx.remove_value(key, value.as_bytes())
        }
    })?;
    print_node(&node);

    engine.close()?;
    Ok(())
}
