//! Storage driver: data directory layout and file handout.

use crate::error::StorageResult;
use crate::file::FileBackend;
use crate::StorageBackend;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the write-ahead log within the data directory.
pub const WAL_FILE: &str = "journal.dat";

/// File name of the model snapshot within the data directory.
pub const SNAPSHOT_FILE: &str = "snapshot.dat";

/// Temporary file used while replacing the journal atomically.
const WAL_TEMP: &str = "journal.dat.tmp";

/// Owns the data directory and the paths of the two database files.
///
/// The driver is the only component that knows where bytes live on disk:
///
/// ```text
/// <data_dir>/
/// ├─ journal.dat    # write-ahead log
/// └─ snapshot.dat   # model image
/// ```
///
/// Construction guarantees the directory exists (creating missing
/// parents). Every open creates the target file if it is absent.
#[derive(Debug, Clone)]
pub struct StorageDriver {
    data_dir: PathBuf,
}

impl StorageDriver {
    /// Creates a driver for `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created.
    pub fn new(data_dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(data_dir)?;
        debug!(dir = %data_dir.display(), "storage driver initialised");
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
        })
    }

    /// Returns the data directory path.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the path of the journal file.
    #[must_use]
    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join(WAL_FILE)
    }

    /// Returns the path of the snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// Opens the journal for reading, creating it if absent.
    pub fn open_wal_read(&self) -> StorageResult<Box<dyn StorageBackend>> {
        Ok(Box::new(FileBackend::open(&self.wal_path())?))
    }

    /// Opens the journal for writing, creating it if absent.
    pub fn open_wal_write(&self) -> StorageResult<Box<dyn StorageBackend>> {
        Ok(Box::new(FileBackend::open(&self.wal_path())?))
    }

    /// Opens the snapshot for reading, creating it if absent.
    pub fn open_snapshot_read(&self) -> StorageResult<Box<dyn StorageBackend>> {
        Ok(Box::new(FileBackend::open(&self.snapshot_path())?))
    }

    /// Opens the snapshot for writing, discarding any previous image.
    pub fn open_snapshot_write(&self) -> StorageResult<Box<dyn StorageBackend>> {
        Ok(Box::new(FileBackend::open_truncated(&self.snapshot_path())?))
    }

    /// Atomically replaces the journal with a file containing `initial`.
    ///
    /// Writes to a temporary file, fsyncs it, then renames it over
    /// `journal.dat` so that a crash at any point leaves either the old
    /// journal or the complete new one — never a torn mixture. Used by the
    /// vacuum routine, which replaces the journal with a header-only file
    /// before re-encoding the model into it.
    pub fn replace_wal(&self, initial: &[u8]) -> StorageResult<()> {
        let temp_path = self.data_dir.join(WAL_TEMP);

        let mut temp = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        temp.write_all(initial)?;
        temp.sync_all()?;
        drop(temp);

        fs::rename(&temp_path, self.wal_path())?;
        self.sync_dir()?;

        debug!(bytes = initial.len(), "journal replaced");
        Ok(())
    }

    /// Fsyncs the data directory so renames are durable.
    #[cfg(unix)]
    fn sync_dir(&self) -> StorageResult<()> {
        let dir = File::open(&self.data_dir)?;
        dir.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_dir(&self) -> StorageResult<()> {
        // Directory fsync is not available on this platform; the
        // filesystem journal covers metadata durability.
        Ok(())
    }
}
