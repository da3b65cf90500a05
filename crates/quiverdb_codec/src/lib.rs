//! # QuiverDB Codec
//!
//! Binary primitives shared by the QuiverDB on-disk formats.
//!
//! Both the journal and the snapshot are built from the same two building
//! blocks: fixed-width little-endian integers and length-prefixed byte
//! strings (`u32` length immediately followed by the raw bytes). This crate
//! provides a buffer writer and a slice cursor reader for exactly those
//! primitives and nothing else — the formats themselves are owned by
//! `quiverdb_core`.
//!
//! ## Example
//!
//! ```rust
//! use quiverdb_codec::{ByteReader, ByteWriter};
//!
//! let mut w = ByteWriter::new();
//! w.put_u64(42);
//! w.put_bytes(b"hello").unwrap();
//!
//! let buf = w.into_bytes();
//! let mut r = ByteReader::new(&buf);
//! assert_eq!(r.u64().unwrap(), 42);
//! assert_eq!(r.bytes().unwrap(), b"hello");
//! assert!(r.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod reader;
mod writer;

pub use error::{CodecError, CodecResult};
pub use reader::ByteReader;
pub use writer::ByteWriter;
