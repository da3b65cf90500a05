//! Command implementations.

pub mod add;
pub mod diag;
pub mod get;
pub mod ls;
pub mod pop;
pub mod push;
pub mod rm;
pub mod set;
pub mod vacuum;

use quiverdb_core::{Config, Engine, NodeView};
use std::path::Path;

/// Opens the engine on `data_dir` for a one-shot command.
///
/// The background vacuum timer stays off; one-shot commands do their work
/// and exit.
pub fn open_engine(data_dir: &Path) -> Result<Engine, Box<dyn std::error::Error>> {
    let config = Config::new().data_dir(data_dir).vacuum_interval(None);
    Ok(Engine::open(&config)?)
}

/// Prints one node in the `key @version: values` form shared by the
/// mutating and reading commands.
pub fn print_node(node: &NodeView) {
    print!("{} @{}:", node.key, node.version);
    if node.values.is_empty() {
        print!(" (empty)");
    }
    for value in &node.values {
        print!(" \"{}\"", display_value(value));
    }
    println!();
}

/// Renders an opaque value for terminal output.
pub fn display_value(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}
