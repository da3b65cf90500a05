//! File-based byte store.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A byte store backed by a single file.
///
/// Opening creates the file if it does not exist. The current length is
/// cached so that `len` and bounds checks do not hit the filesystem; the
/// cache is kept in lockstep with every append and truncation.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: Mutex<File>,
    size: u64,
}

impl FileBackend {
    /// Opens the file at `path`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            size,
        })
    }

    /// Opens the file at `path` and truncates it to zero length.
    ///
    /// Used for snapshot rewrites, where the previous image is discarded
    /// wholesale.
    pub fn open_truncated(path: &Path) -> StorageResult<Self> {
        let mut backend = Self::open(path)?;
        if backend.size > 0 {
            backend.truncate(0)?;
        }
        Ok(backend)
    }

    /// Returns the path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let end = offset.saturating_add(len as u64);
        if end > self.size {
            return Err(StorageError::ReadOutOfBounds {
                offset,
                len,
                size: self.size,
            });
        }
        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.size;
        if data.is_empty() {
            return Ok(offset);
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        self.size += data.len() as u64;
        Ok(offset)
    }

    fn truncate(&mut self, new_len: u64) -> StorageResult<()> {
        if new_len > self.size {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_len,
                size: self.size,
            });
        }

        let file = self.file.lock();
        file.set_len(new_len)?;
        file.sync_all()?;
        drop(file);
        self.size = new_len;
        Ok(())
    }

    fn len(&self) -> StorageResult<u64> {
        Ok(self.size)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.lock().flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        let mut file = self.file.lock();
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_append_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.dat");

        let mut backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.len().unwrap(), 0);

        assert_eq!(backend.append(b"alpha").unwrap(), 0);
        assert_eq!(backend.append(b"beta").unwrap(), 5);
        assert_eq!(backend.len().unwrap(), 9);

        assert_eq!(backend.read_at(0, 9).unwrap(), b"alphabeta");
        assert_eq!(backend.read_at(5, 4).unwrap(), b"beta");
    }

    #[test]
    fn read_out_of_bounds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.dat");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append(b"abc").unwrap();

        let err = backend.read_at(2, 5).unwrap_err();
        assert!(matches!(err, StorageError::ReadOutOfBounds { .. }));
    }

    #[test]
    fn truncate_shortens_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.dat");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append(b"0123456789").unwrap();
        backend.truncate(4).unwrap();

        assert_eq!(backend.len().unwrap(), 4);
        assert_eq!(backend.read_at(0, 4).unwrap(), b"0123");
        assert!(backend.read_at(0, 5).is_err());

        // The shortened length is visible through a fresh handle.
        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 4);
    }

    #[test]
    fn truncate_beyond_end_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.dat");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append(b"ab").unwrap();

        let err = backend.truncate(10).unwrap_err();
        assert!(matches!(err, StorageError::TruncateBeyondEnd { .. }));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.dat");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"durable").unwrap();
            backend.sync().unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.len().unwrap(), 7);
        assert_eq!(backend.read_at(0, 7).unwrap(), b"durable");
    }

    #[test]
    fn open_truncated_discards_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.dat");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"old image").unwrap();
        }

        let backend = FileBackend::open_truncated(&path).unwrap();
        assert_eq!(backend.len().unwrap(), 0);
    }
}
