//! Transactions and the operations they expose.

use crate::engine::EngineInner;
use crate::error::{CoreError, CoreResult};
use crate::model::{restore, Model, Value};
use crate::wal::{RecordType, WalRecord};
use parking_lot::MutexGuard;
use tracing::error;

/// A point-in-time copy of one node, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
    /// The node's key.
    pub key: String,
    /// Version stamp: the node's last-change id, or the model version for
    /// a key that (no longer) exists.
    pub version: u64,
    /// The node's values in insertion order.
    pub values: Vec<Value>,
}

/// One page of a key listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedNodeList {
    /// The nodes of this page, sorted lexicographically by key.
    pub nodes: Vec<NodeView>,
    /// Model version at the time of the listing.
    pub version: u64,
    /// Total number of keys matching the prefix, across all pages.
    pub total_count: usize,
}

/// An open transaction, holding the engine lock.
///
/// All engine operations live here. Mutations write a journal record and
/// apply it to the model immediately; the commit marker written by
/// [`Transaction::commit`] makes them durable as one unit. Dropping the
/// guard without committing rolls back: the journal is truncated to the
/// transaction start and the model is rebuilt from snapshot + journal,
/// which is unconditionally correct however far the transaction got.
pub struct Transaction<'a> {
    inner: MutexGuard<'a, EngineInner>,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(inner: MutexGuard<'a, EngineInner>) -> Self {
        Self {
            inner,
            finished: false,
        }
    }

    /// Commits the transaction, making its records durable.
    pub fn commit(mut self) -> CoreResult<()> {
        self.inner.wal.commit_tx()?;
        self.finished = true;
        Ok(())
    }

    /// Rolls the transaction back explicitly.
    pub fn rollback(mut self) -> CoreResult<()> {
        let result = self.rollback_inner();
        self.finished = true;
        result
    }

    fn rollback_inner(&mut self) -> CoreResult<()> {
        self.inner.wal.rollback_tx()?;
        // Journal truncation reverts persistence; the in-memory model is
        // reverted by recomputing it from snapshot + truncated journal.
        let inner = &mut *self.inner;
        inner.model = restore::restore(&inner.driver)?;
        Ok(())
    }

    /// Returns the current data version (`model.last_change_id`).
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.model.last_change_id().as_u64()
    }

    /// Returns a snapshot of the node under `key`.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::NoSuchKey`] if the key has no node.
    pub fn get(&self, key: &str) -> CoreResult<NodeView> {
        match self.inner.model.get(key) {
            Some(_) => Ok(self.view(key)),
            None => Err(CoreError::no_such_key(key)),
        }
    }

    /// Returns a page of nodes whose keys start with `prefix`, sorted
    /// lexicographically by key.
    ///
    /// `total_count` is the number of prefix matches across all pages and
    /// `version` the model version of the listing. If `expected_version`
    /// is non-zero and differs from the current version, the listing is
    /// refused.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::DataOutOfDate`] on a version mismatch.
    pub fn list(
        &self,
        prefix: &str,
        skip: usize,
        limit: usize,
        expected_version: u64,
    ) -> CoreResult<PagedNodeList> {
        let model = &self.inner.model;
        let current = model.last_change_id().as_u64();
        if expected_version != 0 && expected_version != current {
            return Err(CoreError::DataOutOfDate {
                expected: expected_version,
                current,
            });
        }

        let mut matches: Vec<&str> = model
            .nodes()
            .map(crate::model::Node::key)
            .filter(|key| prefix.is_empty() || key.starts_with(prefix))
            .collect();
        matches.sort_unstable();

        let total_count = matches.len();
        let low = skip.min(total_count);
        let high = skip.saturating_add(limit).min(total_count);
        let nodes = matches[low..high]
            .iter()
            .map(|key| self.view(key))
            .collect();

        Ok(PagedNodeList {
            nodes,
            version: current,
            total_count,
        })
    }

    /// Replaces the node's whole value list.
    ///
    /// With an empty `values`: an absent key is a no-op (an empty view
    /// stamped with the current version is returned), an existing key is
    /// removed. Otherwise every existing value is removed and every new
    /// value appended, in order.
    pub fn set(&mut self, key: &str, values: &[Value]) -> CoreResult<NodeView> {
        if values.is_empty() {
            if self.inner.model.get(key).is_none() {
                return Ok(self.view(key));
            }
            self.write_record(RecordType::RemoveKey, key, Vec::new())?;
            return Ok(self.view(key));
        }

        let existing: Vec<Value> = self
            .inner
            .model
            .get(key)
            .map(|node| node.values().to_vec())
            .unwrap_or_default();
        for value in existing {
            self.write_record(RecordType::RemoveValue, key, value)?;
        }
        for value in values {
            self.write_record(RecordType::AddValue, key, value.clone())?;
        }
        Ok(self.view(key))
    }

    /// Appends a value to the node, creating it if absent. Duplicates are
    /// allowed.
    pub fn add_value(&mut self, key: &str, value: Value) -> CoreResult<NodeView> {
        self.write_record(RecordType::AddValue, key, value)?;
        Ok(self.view(key))
    }

    /// Appends a value the node does not already contain.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::DuplicateValue`] if an equal value is
    /// already present; nothing is written in that case.
    pub fn add_unique_value(&mut self, key: &str, value: Value) -> CoreResult<NodeView> {
        if let Some(node) = self.inner.model.get(key) {
            if node.contains(&value) {
                return Err(CoreError::duplicate_value(key));
            }
        }
        self.write_record(RecordType::AddValue, key, value)?;
        Ok(self.view(key))
    }

    /// Removes one occurrence of `value` from the node.
    ///
    /// Removing the node's only value removes the key instead, so a
    /// committed node always holds at least one value.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::NoSuchKey`] if the key has no node and
    /// [`CoreError::NoSuchValue`] if the value is not present.
    pub fn remove_value(&mut self, key: &str, value: &[u8]) -> CoreResult<NodeView> {
        let node = self
            .inner
            .model
            .get(key)
            .ok_or_else(|| CoreError::no_such_key(key))?;
        if !node.contains(value) {
            return Err(CoreError::no_such_value(key));
        }

        if node.values().len() == 1 {
            self.write_record(RecordType::RemoveKey, key, Vec::new())?;
        } else {
            self.write_record(RecordType::RemoveValue, key, value.to_vec())?;
        }
        Ok(self.view(key))
    }

    /// Removes every occurrence of `value` from the node, one record per
    /// occurrence, followed by a key removal if the node ends up empty.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::NoSuchKey`] if the key has no node and
    /// [`CoreError::NoSuchValue`] if the value is not present.
    pub fn remove_all_values(&mut self, key: &str, value: &[u8]) -> CoreResult<NodeView> {
        let occurrences = self
            .inner
            .model
            .get(key)
            .ok_or_else(|| CoreError::no_such_key(key))?
            .count_of(value);
        if occurrences == 0 {
            return Err(CoreError::no_such_value(key));
        }

        for _ in 0..occurrences {
            self.write_record(RecordType::RemoveValue, key, value.to_vec())?;
        }
        if self
            .inner
            .model
            .get(key)
            .is_some_and(|node| node.values().is_empty())
        {
            self.write_record(RecordType::RemoveKey, key, Vec::new())?;
        }
        Ok(self.view(key))
    }

    /// Removes the key and all its values.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::NoSuchKey`] if the key has no node.
    pub fn remove_key(&mut self, key: &str) -> CoreResult<()> {
        if self.inner.model.get(key).is_none() {
            return Err(CoreError::no_such_key(key));
        }
        self.write_record(RecordType::RemoveKey, key, Vec::new())
    }

    /// Writes one record to the journal and applies it to the model.
    ///
    /// If the journal write succeeds but the apply fails, the error
    /// propagates and the transaction's rollback truncates the journal,
    /// so the pair stays consistent.
    fn write_record(&mut self, record_type: RecordType, key: &str, value: Vec<u8>) -> CoreResult<()> {
        let inner = &mut *self.inner;
        let mut record = WalRecord::new(record_type, key, value);
        inner.wal.write(&mut record)?;
        inner.model.apply(&record)
    }

    fn view(&self, key: &str) -> NodeView {
        view_of(&self.inner.model, key)
    }
}

fn view_of(model: &Model, key: &str) -> NodeView {
    match model.get(key) {
        Some(node) => NodeView {
            key: key.to_string(),
            version: node.last_change_id().as_u64(),
            values: node.values().to_vec(),
        },
        None => NodeView {
            key: key.to_string(),
            version: model.last_change_id().as_u64(),
            values: Vec::new(),
        },
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.rollback_inner() {
                error!(error = %e, "rollback on drop failed");
            }
        }
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("finished", &self.finished)
            .field("version", &self.version())
            .finish()
    }
}
