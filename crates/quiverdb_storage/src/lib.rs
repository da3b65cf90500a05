//! # QuiverDB Storage
//!
//! Storage driver and byte-store backends for QuiverDB.
//!
//! This crate sits below the journal and snapshot formats. It knows about
//! *files* — where they live, how to open them, how to replace the journal
//! atomically — but never about their contents. Format interpretation is
//! owned entirely by `quiverdb_core`.
//!
//! Two layers:
//!
//! - [`StorageBackend`] — an opaque byte store (read at offset, append,
//!   truncate, sync). Implemented by [`FileBackend`] for real databases
//!   and [`MemoryBackend`] for tests.
//! - [`StorageDriver`] — owns the data directory and the two well-known
//!   file names (`journal.dat`, `snapshot.dat`), hands out opened backends.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod driver;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use driver::{StorageDriver, SNAPSHOT_FILE, WAL_FILE};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::MemoryBackend;
