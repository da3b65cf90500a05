//! Error types for codec operations.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding binary data.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input ended before a complete field could be read.
    #[error("unexpected end of input: needed {needed} more bytes at offset {offset}")]
    UnexpectedEof {
        /// Offset at which the read was attempted.
        offset: usize,
        /// Number of bytes that were missing.
        needed: usize,
    },

    /// A byte string exceeds the 4 GiB limit of its `u32` length prefix.
    #[error("byte string too long: {len} bytes exceeds u32 length prefix")]
    LengthOverflow {
        /// The offending length.
        len: usize,
    },

    /// A field declared as UTF-8 contained invalid byte sequences.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
}
