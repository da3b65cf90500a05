//! In-memory byte store for tests.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};

/// A byte store held entirely in memory.
///
/// Used by unit tests that exercise the journal and snapshot machinery
/// without touching the filesystem. `flush` and `sync` are no-ops.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: Vec<u8>,
}

impl MemoryBackend {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with `data`.
    ///
    /// Handy for recovery tests that need a hand-crafted file image.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Returns the full contents of the store.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.data
    }
}

impl StorageBackend for MemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let end = start.saturating_add(len);
        if end > self.data.len() {
            return Err(StorageError::ReadOutOfBounds {
                offset,
                len,
                size: self.data.len() as u64,
            });
        }
        Ok(self.data[start..end].to_vec())
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(data);
        Ok(offset)
    }

    fn truncate(&mut self, new_len: u64) -> StorageResult<()> {
        if new_len > self.data.len() as u64 {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_len,
                size: self.data.len() as u64,
            });
        }
        self.data.truncate(new_len as usize);
        Ok(())
    }

    fn len(&self) -> StorageResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }
}
