//! QuiverDB CLI
//!
//! Command-line front-end for a QuiverDB data directory.
//!
//! # Commands
//!
//! - `set` / `add` / `push` / `pop` / `rm` - mutate keys and values
//! - `get` / `ls` - read keys
//! - `vacuum` - one-shot log compaction
//! - `diag snapshot` / `diag wal` - decode the on-disk files

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// QuiverDB command-line tools.
#[derive(Parser)]
#[command(name = "quiverdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long, default_value = "./data")]
    data: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the whole value list of a key
    Set {
        /// Key to write
        key: String,
        /// New values, in order; none at all removes the key
        values: Vec<String>,
    },

    /// Append a value to a key (duplicates allowed)
    Add {
        /// Key to append to
        key: String,
        /// Value to append
        value: String,
    },

    /// Append a value to a key, refusing duplicates
    Push {
        /// Key to append to
        key: String,
        /// Value to append
        value: String,
    },

    /// Remove a value from a key
    Pop {
        /// Key to remove from
        key: String,
        /// Value to remove
        value: String,
        /// Remove every occurrence instead of the first
        #[arg(short, long)]
        all: bool,
    },

    /// Remove a key and all its values
    Rm {
        /// Key to remove
        key: String,
    },

    /// Print one key with its values
    Get {
        /// Key to read
        key: String,
    },

    /// List keys, optionally filtered by prefix
    Ls {
        /// Key prefix to filter by
        prefix: Option<String>,

        /// Number of matching keys to skip
        #[arg(short, long, default_value = "0")]
        skip: usize,

        /// Maximum number of keys to print
        #[arg(short, long, default_value = "100")]
        max: usize,
    },

    /// Run the log-compaction routine once
    Vacuum,

    /// Decode and print the on-disk files
    #[command(subcommand)]
    Diag(DiagCommands),

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum DiagCommands {
    /// Decode and print snapshot.dat
    Snapshot {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Walk and print the records of journal.dat
    Wal {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Set { key, values } => commands::set::run(&cli.data, &key, &values)?,
        Commands::Add { key, value } => commands::add::run(&cli.data, &key, &value)?,
        Commands::Push { key, value } => commands::push::run(&cli.data, &key, &value)?,
        Commands::Pop { key, value, all } => commands::pop::run(&cli.data, &key, &value, all)?,
        Commands::Rm { key } => commands::rm::run(&cli.data, &key)?,
        Commands::Get { key } => commands::get::run(&cli.data, &key)?,
        Commands::Ls { prefix, skip, max } => {
            commands::ls::run(&cli.data, prefix.as_deref().unwrap_or(""), skip, max)?;
        }
        Commands::Vacuum => commands::vacuum::run(&cli.data)?,
        Commands::Diag(DiagCommands::Snapshot { format }) => {
            commands::diag::snapshot(&cli.data, &format)?;
        }
        Commands::Diag(DiagCommands::Wal { format, limit }) => {
            commands::diag::wal(&cli.data, &format, limit)?;
        }
        Commands::Version => {
            println!("QuiverDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("QuiverDB Core v{}", quiverdb_core::VERSION);
        }
    }

    Ok(())
}
