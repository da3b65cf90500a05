//! # QuiverDB Core
//!
//! Storage and execution core of QuiverDB, a single-node key /
//! multi-value database. A key maps to an ordered multiset of opaque byte
//! values; clients append values, remove specific occurrences, replace
//! whole lists, list by key prefix, or delete keys entirely.
//!
//! This crate provides:
//! - the write-ahead log (`journal.dat`): record format, transactional
//!   framing, startup validation with tail correction
//! - the in-memory data model and its deterministic record-apply machine
//! - the snapshot image (`snapshot.dat`) and the restore protocol
//! - the engine: a single-writer transactional surface over model + WAL
//! - vacuum: snapshot + journal-rewrite log compaction
//!
//! ## Durability model
//!
//! Every mutation is framed inside a transaction. Records are appended to
//! the journal first and applied to the in-memory model immediately after,
//! both under one engine lock; a commit marker record makes the
//! transaction durable. On startup, any journal tail past the last commit
//! marker is truncated — no partial transaction is ever replayed.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod types;

pub mod engine;
pub mod model;
pub mod wal;

pub use config::Config;
pub use engine::{Engine, NodeView, PagedNodeList, Transaction};
pub use error::{CoreError, CoreResult};
pub use model::{Model, Node, Value};
pub use types::{RecordId, TxId};

/// Crate version, surfaced by the command-line tools.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
