//! Error types for QuiverDB core operations.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in QuiverDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested key has no node.
    #[error("no such key: \"{key}\"")]
    NoSuchKey {
        /// The key that was looked up.
        key: String,
    },

    /// The key exists but does not contain the requested value.
    #[error("no such value under key \"{key}\"")]
    NoSuchValue {
        /// The key whose node was searched.
        key: String,
    },

    /// A unique add was refused because an equal value is already present.
    #[error("duplicate value under key \"{key}\"")]
    DuplicateValue {
        /// The key whose node already holds the value.
        key: String,
    },

    /// An optimistic version check failed.
    #[error("data out of date: expected version {expected}, current is {current}")]
    DataOutOfDate {
        /// Version the caller expected.
        expected: u64,
        /// Current model version.
        current: u64,
    },

    /// A journal record was replayed against a model that is already newer.
    #[error("change {id} already applied: model is at {last}")]
    ChangeAlreadyApplied {
        /// Id of the offending record.
        id: u64,
        /// The model's last-change id.
        last: u64,
    },

    /// A journal record carries a type byte this build does not understand.
    #[error("unknown journal record type: 0x{code:02x}")]
    UnknownRecordType {
        /// The unrecognised type byte.
        code: u8,
    },

    /// A transaction was begun while another one is open.
    #[error("already in a transaction")]
    AlreadyInTx,

    /// A framing operation was issued outside a transaction.
    #[error("not in a transaction")]
    NotInTx,

    /// The engine refused the operation because it is shutting down.
    #[error("engine is shut down")]
    Shutdown,

    /// A journal or snapshot file declares a schema version this build
    /// does not understand.
    #[error("unsupported schema version: {version}")]
    SchemaMismatch {
        /// The declared version.
        version: u32,
    },

    /// The journal is structurally damaged.
    #[error("journal corruption: {message}")]
    WalCorruption {
        /// Description of the damage.
        message: String,
    },

    /// The snapshot image is structurally damaged.
    #[error("snapshot corruption: {message}")]
    SnapshotCorruption {
        /// Description of the damage.
        message: String,
    },

    /// A record is structurally invalid for its type.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the violation.
        message: String,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] quiverdb_storage::StorageError),

    /// Binary codec error.
    #[error("codec error: {0}")]
    Codec(#[from] quiverdb_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Creates a `NoSuchKey` error.
    pub fn no_such_key(key: impl Into<String>) -> Self {
        Self::NoSuchKey { key: key.into() }
    }

    /// Creates a `NoSuchValue` error.
    pub fn no_such_value(key: impl Into<String>) -> Self {
        Self::NoSuchValue { key: key.into() }
    }

    /// Creates a `DuplicateValue` error.
    pub fn duplicate_value(key: impl Into<String>) -> Self {
        Self::DuplicateValue { key: key.into() }
    }

    /// Creates a journal corruption error.
    pub fn wal_corruption(message: impl Into<String>) -> Self {
        Self::WalCorruption {
            message: message.into(),
        }
    }

    /// Creates a snapshot corruption error.
    pub fn snapshot_corruption(message: impl Into<String>) -> Self {
        Self::SnapshotCorruption {
            message: message.into(),
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }
}
