//! The engine: a single-writer transactional surface over model + journal.
//!
//! One coarse mutex covers the model, the journal writer, and the storage
//! driver. Every operation — reads included — runs under that lock, which
//! makes the engine strictly serializable by construction. Mutations are
//! written to the journal first and applied to the model immediately
//! after; a commit marker makes the whole transaction durable at once.
//!
//! Two transactional surfaces are offered:
//!
//! - [`Engine::tx`] runs a closure inside a transaction: commit on `Ok`,
//!   rollback on `Err`, rollback on panic (via the guard's `Drop`).
//! - [`Engine::begin`] hands out a [`Transaction`] guard for manual
//!   control; dropping it without [`Transaction::commit`] rolls back.

mod transaction;

pub use transaction::{NodeView, PagedNodeList, Transaction};

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::model::{restore, Model};
use crate::wal::{encode_wal_header, RecordType, WalRecord, WalWriter};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use quiverdb_storage::StorageDriver;
use tracing::{error, info, warn};

/// Everything the engine lock protects.
pub(crate) struct EngineInner {
    pub(crate) driver: StorageDriver,
    pub(crate) wal: WalWriter,
    pub(crate) model: Model,
    pub(crate) sync_on_commit: bool,
}

/// The QuiverDB engine.
///
/// Opening an engine validates the journal (truncating any uncommitted
/// tail), loads the snapshot, and replays the journal on top of it. The
/// engine exclusively owns the model, the journal writer, and the storage
/// driver for its entire lifetime.
pub struct Engine {
    inner: Mutex<EngineInner>,
    shutdown: AtomicBool,
    vacuum_interval: Option<Duration>,
    timer_gate: Mutex<()>,
    timer_wake: Condvar,
    timer_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Opens the engine on a data directory.
    ///
    /// # Errors
    ///
    /// Fails on storage errors, an unsupported journal or snapshot schema
    /// version, or a malformed snapshot. A malformed journal *tail* is not
    /// an error — it is truncated, which is the one automatic repair the
    /// format supports.
    pub fn open(config: &Config) -> CoreResult<Self> {
        let driver = StorageDriver::new(&config.data_dir)?;
        let wal = WalWriter::open(driver.open_wal_write()?, config.sync_on_commit)?;
        let model = restore::restore(&driver)?;
        info!(
            dir = %config.data_dir.display(),
            keys = model.len(),
            version = %model.last_change_id(),
            "engine opened"
        );

        Ok(Self {
            inner: Mutex::new(EngineInner {
                driver,
                wal,
                model,
                sync_on_commit: config.sync_on_commit,
            }),
            shutdown: AtomicBool::new(false),
            vacuum_interval: config.vacuum_interval,
            timer_gate: Mutex::new(()),
            timer_wake: Condvar::new(),
            timer_handle: Mutex::new(None),
        })
    }

    /// Runs `f` inside a transaction.
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back if it
    /// returns `Err`; if `f` panics, the unwinding guard rolls back too.
    /// Operation errors surfaced *inside* `f` (say, a `NoSuchKey` the
    /// closure handles) do not force a rollback — only an `Err` escaping
    /// the closure does.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Shutdown`] once the engine is closing, any
    /// error from `f`, or a commit failure.
    pub fn tx<T>(&self, f: impl FnOnce(&mut Transaction<'_>) -> CoreResult<T>) -> CoreResult<T> {
        let mut tx = self.begin()?;
        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    error!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Begins a transaction and returns its guard.
    ///
    /// The guard holds the engine lock for its whole lifetime; no other
    /// caller can touch the engine until it is committed, rolled back, or
    /// dropped (which rolls back).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Shutdown`] once the engine is closing.
    pub fn begin(&self) -> CoreResult<Transaction<'_>> {
        if self.is_shut_down() {
            return Err(CoreError::Shutdown);
        }
        let mut guard = self.inner.lock();
        guard.wal.begin_tx()?;
        Ok(Transaction::new(guard))
    }

    /// Runs the vacuum (log-compaction) routine.
    ///
    /// Under the engine lock:
    /// 1. write a fresh snapshot of the current model and fsync it;
    /// 2. sync the journal and atomically replace it with a header-only
    ///    file;
    /// 3. reopen the journal writer, seeded so record ids continue above
    ///    the model version, and write one transaction that re-encodes
    ///    the model (per key: `RemoveKey`, then one `AddValue` per value,
    ///    in sorted key order);
    /// 4. re-run restore against the new files.
    ///
    /// Crash-safe at every step: the snapshot is durable before the old
    /// journal is dropped, and an interrupted rewrite transaction is
    /// truncated by the next open, leaving the snapshot authoritative.
    pub fn vacuum(&self) -> CoreResult<()> {
        if self.is_shut_down() {
            return Err(CoreError::Shutdown);
        }
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        info!(keys = inner.model.len(), "vacuum started");

        restore::write_snapshot(&inner.driver, &inner.model)?;

        inner.wal.sync()?;
        inner.driver.replace_wal(&encode_wal_header())?;

        let mut wal = WalWriter::open(inner.driver.open_wal_write()?, inner.sync_on_commit)?;
        wal.seed_ids(inner.model.last_change_id().as_u64())?;
        wal.begin_tx()?;
        for key in inner.model.keys() {
            if let Some(node) = inner.model.get(&key) {
                let mut remove = WalRecord::new(RecordType::RemoveKey, key.clone(), Vec::new());
                wal.write(&mut remove)?;
                for value in node.values() {
                    let mut add = WalRecord::new(RecordType::AddValue, key.clone(), value.clone());
                    wal.write(&mut add)?;
                }
            }
        }
        wal.commit_tx()?;
        inner.wal = wal;

        inner.model = restore::restore(&inner.driver)?;
        info!(version = %inner.model.last_change_id(), "vacuum finished");
        Ok(())
    }

    /// Spawns the background vacuum timer thread, if the configuration
    /// enables one.
    ///
    /// The thread runs [`Engine::vacuum`] every `vacuum_interval` and
    /// exits promptly when the engine shuts down.
    pub fn spawn_vacuum_timer(this: &Arc<Self>) -> CoreResult<()> {
        let Some(interval) = this.vacuum_interval else {
            return Ok(());
        };

        let engine = Arc::clone(this);
        let handle = std::thread::Builder::new()
            .name("quiverdb-vacuum".into())
            .spawn(move || loop {
                // The shutdown check happens under the gate so that a
                // notification from `close` cannot slip in between the
                // check and the wait.
                let mut gate = engine.timer_gate.lock();
                if engine.is_shut_down() {
                    break;
                }
                let timed_out = engine.timer_wake.wait_for(&mut gate, interval).timed_out();
                drop(gate);

                if engine.is_shut_down() {
                    break;
                }
                if timed_out {
                    if let Err(e) = engine.vacuum() {
                        if !matches!(e, CoreError::Shutdown) {
                            error!(error = %e, "background vacuum failed");
                        }
                    }
                }
            })?;

        *this.timer_handle.lock() = Some(handle);
        Ok(())
    }

    /// Returns `true` once [`Engine::close`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Shuts the engine down: stops the vacuum timer, writes a final
    /// snapshot, and syncs the journal. Idempotent.
    pub fn close(&self) -> CoreResult<()> {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // Taking the gate after raising the flag guarantees the timer
        // thread is either already waiting (the notify wakes it) or has
        // not yet re-checked the flag (it will see it and exit).
        drop(self.timer_gate.lock());
        self.timer_wake.notify_all();
        if let Some(handle) = self.timer_handle.lock().take() {
            if handle.join().is_err() {
                warn!("vacuum timer thread panicked");
            }
        }

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.wal.sync()?;
        restore::write_snapshot(&inner.driver, &inner.model)?;
        info!(version = %inner.model.last_change_id(), "engine closed");
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if !self.is_shut_down() {
            if let Err(e) = self.close() {
                error!(error = %e, "close on drop failed");
            }
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("shutdown", &self.is_shut_down())
            .field("vacuum_interval", &self.vacuum_interval)
            .finish_non_exhaustive()
    }
}
