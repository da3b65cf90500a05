//! Sequential journal reader.

use crate::error::{CoreError, CoreResult};
use crate::wal::record::{WalRecord, RECORD_HEADER_LEN, WAL_HEADER_LEN, WAL_VERSION};
use quiverdb_codec::ByteReader;
use quiverdb_storage::StorageBackend;

/// Reads one record starting at `offset`, returning the record and its
/// encoded length, or `None` at a clean end-of-file.
///
/// A record torn at the end of the file (header or payload cut short) is
/// reported as [`CoreError::WalCorruption`]; the writer's initialisation
/// routine treats that as a damaged tail and truncates it, while the
/// reader propagates it.
pub(crate) fn read_record_at(
    backend: &dyn StorageBackend,
    offset: u64,
) -> CoreResult<Option<(WalRecord, u64)>> {
    let size = backend.len()?;
    if offset >= size {
        return Ok(None);
    }

    if offset + RECORD_HEADER_LEN as u64 > size {
        return Err(CoreError::wal_corruption(format!(
            "record header torn at offset {offset} (file is {size} bytes)"
        )));
    }

    let header = backend.read_at(offset, RECORD_HEADER_LEN)?;
    let body_len = WalRecord::decode_body_len(&header)?;
    let total_len = RECORD_HEADER_LEN as u64 + body_len;

    if offset + total_len > size {
        return Err(CoreError::wal_corruption(format!(
            "record payload torn at offset {offset}: need {total_len} bytes, {} available",
            size - offset
        )));
    }

    let image = backend.read_at(offset, total_len as usize)?;
    let record = WalRecord::decode(&image)?;
    Ok(Some((record, total_len)))
}

/// Sequentially yields journal records.
///
/// Opening validates the 4-byte file header and positions the cursor
/// right after it; an entirely empty file reads as an empty journal. The
/// reader performs no semantic validation of ids or transaction framing —
/// that is the writer's job at startup.
pub struct WalReader {
    backend: Box<dyn StorageBackend>,
    offset: u64,
}

impl WalReader {
    /// Opens a reader over a journal backend.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::SchemaMismatch`] if the header declares an
    /// unsupported version, or [`CoreError::WalCorruption`] if the header
    /// itself is torn.
    pub fn open(backend: Box<dyn StorageBackend>) -> CoreResult<Self> {
        let size = backend.len()?;
        if size == 0 {
            return Ok(Self { backend, offset: 0 });
        }
        if size < WAL_HEADER_LEN {
            return Err(CoreError::wal_corruption(format!(
                "journal header torn: file is {size} bytes"
            )));
        }

        let header = backend.read_at(0, WAL_HEADER_LEN as usize)?;
        let version = ByteReader::new(&header).u32()?;
        if version != WAL_VERSION {
            return Err(CoreError::SchemaMismatch { version });
        }

        Ok(Self {
            backend,
            offset: WAL_HEADER_LEN,
        })
    }

    /// Returns the next record, or `None` at end of journal.
    pub fn next_record(&mut self) -> CoreResult<Option<WalRecord>> {
        match read_record_at(&*self.backend, self.offset)? {
            Some((record, len)) => {
                self.offset += len;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Returns the current file offset of the cursor.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.offset
    }
}
