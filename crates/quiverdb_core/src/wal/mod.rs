//! Write-ahead log: record format, sequential reader, framing writer.
//!
//! The journal (`journal.dat`) is the durable record of every mutation.
//! It begins with a 4-byte header (`u32` format version, little-endian)
//! followed by zero or more records:
//!
//! ```text
//! offset  size  field
//!   0      8    id          (u64)
//!   8      8    txID        (u64)
//!  16      1    type        (u8)
//!  17      4    key_len     (u32)
//!  21      4    value_len   (u32)
//!  25      K    key bytes   (UTF-8)
//! 25+K     V    value bytes
//! ```
//!
//! Records carry no checksum or trailer: their length is computable from
//! the fixed 25-byte header, and transactional framing (the commit-marker
//! record) is what decides which records survive recovery.
//!
//! ## Invariants
//!
//! - Adjacent records have consecutive ids (`r[i+1].id == r[i].id + 1`).
//! - The transaction id may only change directly after a `CommitTx`.
//! - A valid journal ends with a `CommitTx`; the writer truncates any
//!   tail past the last commit marker when it opens the file.

mod reader;
mod record;
mod writer;

pub use reader::WalReader;
pub use record::{
    encode_wal_header, RecordType, WalRecord, RECORD_HEADER_LEN, WAL_HEADER_LEN, WAL_VERSION,
};
pub use writer::WalWriter;
