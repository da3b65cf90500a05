//! `ls` command: paged key listing with optional prefix filter.

use super::{open_engine, print_node};
use std::path::Path;

/// Runs the ls command.
pub fn run(
    data_dir: &Path,
    prefix: &str,
    skip: usize,
    max: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(data_dir)?;

    let list = engine.tx(|tx| tx.list(prefix, skip, max, 0))?;
    for node in &list.nodes {
        print_node(node);
    }
    println!(
        "{} of {} keys (version {})",
        list.nodes.len(),
        list.total_count,
        list.version
    );

    engine.close()?;
    Ok(())
}
