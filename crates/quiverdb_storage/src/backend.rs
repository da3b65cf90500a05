//! Byte-store backend trait.

use crate::error::StorageResult;

/// An opaque byte store underneath the journal and snapshot files.
///
/// Backends hold bytes and nothing else: they do not understand record
/// framing, headers, or versions. The operations are exactly what the
/// journal machinery needs — positional reads for scanning, appends for
/// writing, truncation for rollback and tail correction.
///
/// # Invariants
///
/// - `append` returns the offset the data landed at, which equals the
///   store size before the call.
/// - `read_at` returns exactly the bytes previously written there.
/// - After `sync` returns, all appended data survives process death.
pub trait StorageBackend: Send {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::StorageError::ReadOutOfBounds`] if the range
    /// extends past the current size — a short read is never returned.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends `data` at the end of the store and returns its offset.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Shortens the store to exactly `new_len` bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::StorageError::TruncateBeyondEnd`] if `new_len`
    /// exceeds the current size; truncation never grows a store.
    fn truncate(&mut self, new_len: u64) -> StorageResult<()>;

    /// Returns the current size in bytes (the offset of the next append).
    fn len(&self) -> StorageResult<u64>;

    /// Returns `true` if the store holds no bytes.
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Pushes buffered writes to the operating system.
    fn flush(&mut self) -> StorageResult<()>;

    /// Forces data and metadata to durable storage.
    fn sync(&mut self) -> StorageResult<()>;
}
