//! Journal writer: transaction framing and startup tail correction.

use crate::error::{CoreError, CoreResult};
use crate::types::{RecordId, TxId};
use crate::wal::reader::read_record_at;
use crate::wal::record::{encode_wal_header, RecordType, WalRecord, WAL_HEADER_LEN, WAL_VERSION};
use quiverdb_codec::ByteReader;
use quiverdb_storage::StorageBackend;
use tracing::{debug, trace, warn};

/// Appends records to the journal under transactional framing.
///
/// The writer owns the journal backend for writing, assigns record and
/// transaction ids, and enforces the framing state machine:
///
/// ```text
/// Closed ──open()──▶ ReadyIdle ──begin_tx()──▶ InTx
///                        ▲                       │
///                        └── commit_tx() ────────┤
///                        └── rollback_tx() ──────┘
/// ```
///
/// Opening validates the journal and performs the one automatic recovery
/// this format supports: the tail past the last commit marker is
/// truncated, so no partial transaction is ever replayed.
pub struct WalWriter {
    backend: Box<dyn StorageBackend>,
    /// Id of the most recently written record.
    id_counter: u64,
    /// Id of the most recently started transaction.
    tx_counter: u64,
    current_tx_id: u64,
    in_tx: bool,
    /// File offset of the next append.
    position: u64,
    /// File offset captured at `begin_tx`, the rollback target.
    tx_start_offset: u64,
    /// `id_counter` captured at `begin_tx`, restored on rollback.
    tx_start_id: u64,
    sync_on_commit: bool,
}

impl WalWriter {
    /// Opens a writer over a journal backend, validating and repairing
    /// the file as needed.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::SchemaMismatch`] on an unsupported header
    /// version, or with corruption / I/O errors that tail truncation
    /// cannot repair.
    pub fn open(backend: Box<dyn StorageBackend>, sync_on_commit: bool) -> CoreResult<Self> {
        let mut writer = Self {
            backend,
            id_counter: 0,
            tx_counter: 0,
            current_tx_id: 0,
            in_tx: false,
            position: 0,
            tx_start_offset: 0,
            tx_start_id: 0,
            sync_on_commit,
        };

        if writer.backend.len()? == 0 {
            writer.init_empty()?;
        } else {
            writer.init_existing()?;
        }
        Ok(writer)
    }

    /// Initialises a brand-new journal: write the header, counters at zero.
    fn init_empty(&mut self) -> CoreResult<()> {
        self.backend.append(&encode_wal_header())?;
        self.backend.sync()?;
        self.position = WAL_HEADER_LEN;
        debug!("journal initialised empty");
        Ok(())
    }

    /// Validates an existing journal and truncates any uncommitted tail.
    fn init_existing(&mut self) -> CoreResult<()> {
        let size = self.backend.len()?;
        if size < WAL_HEADER_LEN {
            return Err(CoreError::wal_corruption(format!(
                "journal header torn: file is {size} bytes"
            )));
        }
        let header = self.backend.read_at(0, WAL_HEADER_LEN as usize)?;
        let version = ByteReader::new(&header).u32()?;
        if version != WAL_VERSION {
            return Err(CoreError::SchemaMismatch { version });
        }

        // Scan forward. A record fails the scan if its id is not the
        // previous id + 1, or if its txID changes without an intervening
        // commit marker. Everything after the last commit marker is then
        // dropped. A record torn at end-of-file counts as a damaged tail
        // as well: a crash mid-append is exactly what this scan repairs.
        let mut offset = WAL_HEADER_LEN;
        let mut has_any = false;
        let mut prev_was_commit = false;
        let mut scan_id: u64 = 0;
        let mut scan_tx: u64 = 0;
        let mut last_valid_id: u64 = 0;
        let mut last_valid_tx: u64 = 0;
        let mut last_valid_end: u64 = WAL_HEADER_LEN;

        loop {
            let record = match read_record_at(&*self.backend, offset) {
                Ok(Some((record, len))) => {
                    offset += len;
                    Some(record)
                }
                Ok(None) => None,
                Err(CoreError::WalCorruption { message }) => {
                    warn!(%message, "journal tail damaged");
                    self.truncate_to(last_valid_end, last_valid_id, last_valid_tx)?;
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            let Some(record) = record else {
                // Clean end of file. The last record must have been a
                // commit marker, otherwise the open transaction is dropped.
                if has_any && !prev_was_commit {
                    warn!(
                        tx = scan_tx,
                        at = scan_id,
                        "journal ends inside a transaction"
                    );
                    self.truncate_to(last_valid_end, last_valid_id, last_valid_tx)?;
                    return Ok(());
                }
                self.id_counter = last_valid_id;
                self.tx_counter = last_valid_tx;
                self.position = self.backend.len()?;
                debug!(
                    last_record = self.id_counter,
                    last_tx = self.tx_counter,
                    "journal validated"
                );
                return Ok(());
            };

            if !has_any {
                has_any = true;
                scan_id = record.id.as_u64();
                scan_tx = record.tx_id.as_u64();
            } else {
                if record.id.as_u64() != scan_id + 1 {
                    warn!(
                        expected = scan_id + 1,
                        got = record.id.as_u64(),
                        "journal record ids out of sequence"
                    );
                    self.truncate_to(last_valid_end, last_valid_id, last_valid_tx)?;
                    return Ok(());
                }
                scan_id = record.id.as_u64();

                if record.tx_id.as_u64() != scan_tx {
                    if !prev_was_commit {
                        warn!(
                            tx = scan_tx,
                            at = scan_id,
                            "transaction changed without a commit marker"
                        );
                        self.truncate_to(last_valid_end, last_valid_id, last_valid_tx)?;
                        return Ok(());
                    }
                    scan_tx = record.tx_id.as_u64();
                }
            }

            prev_was_commit = record.record_type == RecordType::CommitTx;
            if prev_was_commit {
                last_valid_id = record.id.as_u64();
                last_valid_tx = record.tx_id.as_u64();
                last_valid_end = offset;
            }
        }
    }

    /// Shortens the journal to end right after the last committed
    /// transaction and adopts that transaction's counters.
    fn truncate_to(&mut self, end: u64, last_id: u64, last_tx: u64) -> CoreResult<()> {
        warn!(
            end,
            last_record = last_id,
            "truncating journal after last committed transaction"
        );
        self.backend.truncate(end)?;
        self.id_counter = last_id;
        self.tx_counter = last_tx;
        self.position = end;
        Ok(())
    }

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::AlreadyInTx`] if one is already open.
    pub fn begin_tx(&mut self) -> CoreResult<()> {
        if self.in_tx {
            return Err(CoreError::AlreadyInTx);
        }
        self.tx_counter += 1;
        self.current_tx_id = self.tx_counter;
        self.in_tx = true;
        self.tx_start_offset = self.position;
        self.tx_start_id = self.id_counter;
        trace!(tx = self.current_tx_id, at = self.position, "begin tx");
        Ok(())
    }

    /// Writes one record inside the open transaction, assigning its ids.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::NotInTx`] outside a transaction, and with
    /// [`CoreError::InvalidRecord`] for the writer-managed record types
    /// (`None`, `CommitTx`).
    pub fn write(&mut self, record: &mut WalRecord) -> CoreResult<()> {
        if !self.in_tx {
            return Err(CoreError::NotInTx);
        }
        if matches!(record.record_type, RecordType::None | RecordType::CommitTx) {
            return Err(CoreError::invalid_record(format!(
                "record type {:?} is writer-managed",
                record.record_type
            )));
        }
        self.append_record(record)
    }

    /// Commits the open transaction.
    ///
    /// If any record was written since `begin_tx`, a commit marker is
    /// appended and the journal is flushed (and fsynced when configured).
    /// An empty transaction leaves no trace: no marker is written and the
    /// transaction counter is wound back.
    pub fn commit_tx(&mut self) -> CoreResult<()> {
        if !self.in_tx {
            return Err(CoreError::NotInTx);
        }

        if self.position != self.tx_start_offset {
            let mut marker = WalRecord::commit_marker();
            self.append_record(&mut marker)?;
            self.backend.flush()?;
            if self.sync_on_commit {
                self.backend.sync()?;
            }
            trace!(tx = self.current_tx_id, at = self.position, "commit tx");
        } else {
            // Nothing written: erase the transaction entirely.
            self.tx_counter -= 1;
        }

        self.current_tx_id = 0;
        self.in_tx = false;
        self.tx_start_offset = 0;
        Ok(())
    }

    /// Rolls the open transaction back, truncating its records.
    ///
    /// The id counter is wound back to its `begin_tx` value so that the
    /// next transaction's records stay consecutive with the file; an
    /// empty rollback also winds back the transaction counter.
    pub fn rollback_tx(&mut self) -> CoreResult<()> {
        if !self.in_tx {
            return Err(CoreError::NotInTx);
        }

        if self.position != self.tx_start_offset {
            self.backend.truncate(self.tx_start_offset)?;
            self.position = self.tx_start_offset;
            self.id_counter = self.tx_start_id;
            trace!(tx = self.current_tx_id, to = self.position, "rollback tx");
        } else {
            self.tx_counter -= 1;
        }

        self.current_tx_id = 0;
        self.in_tx = false;
        self.tx_start_offset = 0;
        Ok(())
    }

    /// Assigns ids and appends the record.
    fn append_record(&mut self, record: &mut WalRecord) -> CoreResult<()> {
        self.id_counter += 1;
        record.id = RecordId::new(self.id_counter);
        record.tx_id = TxId::new(self.current_tx_id);

        let bytes = record.encode()?;
        self.backend.append(&bytes)?;
        self.position += bytes.len() as u64;
        trace!(
            id = record.id.as_u64(),
            tx = record.tx_id.as_u64(),
            kind = ?record.record_type,
            bytes = bytes.len(),
            "record written"
        );
        Ok(())
    }

    /// Seeds the id counter of a freshly initialised, record-free journal.
    ///
    /// Vacuum rewrites the journal from the model; the rewrite records
    /// must continue above the model's version so that replay and all
    /// later appends keep ids consistent.
    ///
    /// # Errors
    ///
    /// Fails if the journal already contains records or a transaction is
    /// open.
    pub(crate) fn seed_ids(&mut self, base_id: u64) -> CoreResult<()> {
        if self.in_tx || self.id_counter != 0 || self.position != WAL_HEADER_LEN {
            return Err(CoreError::invalid_record(
                "id seeding requires an empty journal",
            ));
        }
        self.id_counter = base_id;
        Ok(())
    }

    /// Returns `true` while a transaction is open.
    #[must_use]
    pub fn in_tx(&self) -> bool {
        self.in_tx
    }

    /// Returns the current append offset.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns the id of the most recently written record.
    #[must_use]
    pub fn last_record_id(&self) -> u64 {
        self.id_counter
    }

    /// Forces all journal data to durable storage.
    pub fn sync(&mut self) -> CoreResult<()> {
        self.backend.sync()?;
        Ok(())
    }

    /// Syncs and closes the journal.
    pub fn close(mut self) -> CoreResult<()> {
        self.backend.sync()?;
        debug!("journal writer closed");
        Ok(())
    }
}

impl std::fmt::Debug for WalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalWriter")
            .field("id_counter", &self.id_counter)
            .field("tx_counter", &self.tx_counter)
            .field("in_tx", &self.in_tx)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}
