//! In-memory data model and the record-apply state machine.
//!
//! The model is a map from key to [`Node`], plus a `last_change_id` that
//! equals the id of the newest non-commit record applied. Applying journal
//! records is the *only* way the model mutates; the engine writes a record
//! to the journal and applies it immediately after, so the two can never
//! observably diverge within a committed transaction.

mod node;
pub mod restore;
pub mod snapshot;

pub use node::{Node, Value};

use crate::error::{CoreError, CoreResult};
use crate::types::RecordId;
use crate::wal::{RecordType, WalRecord, WalReader};
use std::collections::HashMap;
use tracing::debug;

/// The in-memory database state.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Model {
    last_change_id: RecordId,
    nodes: HashMap<String, Node>,
}

impl Model {
    /// Creates an empty model at version zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of the newest committed record applied — the
    /// database version exposed to clients.
    #[must_use]
    pub fn last_change_id(&self) -> RecordId {
        self.last_change_id
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the model holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns all keys in lexicographic order.
    ///
    /// Map iteration order is unspecified; callers that need an order
    /// sort, and this is the sort they use.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.nodes.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Returns the node for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Iterates over all nodes in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Applies one journal record to the model.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::ChangeAlreadyApplied`] if the record is not
    /// newer than the model.
    pub fn apply(&mut self, record: &WalRecord) -> CoreResult<()> {
        if record.id <= self.last_change_id {
            return Err(CoreError::ChangeAlreadyApplied {
                id: record.id.as_u64(),
                last: self.last_change_id.as_u64(),
            });
        }

        match record.record_type {
            RecordType::None => {}
            RecordType::CommitTx => {
                // Commit markers frame transactions; they do not advance
                // the data version.
                return Ok(());
            }
            RecordType::AddValue => {
                self.nodes
                    .entry(record.key.clone())
                    .or_insert_with(|| Node::new(&record.key))
                    .apply(record);
            }
            RecordType::RemoveValue => {
                if let Some(node) = self.nodes.get_mut(&record.key) {
                    node.apply(record);
                } else {
                    debug!(key = %record.key, id = %record.id, "remove-value for absent key");
                }
            }
            RecordType::RemoveKey => {
                if self.nodes.remove(&record.key).is_none() {
                    debug!(key = %record.key, id = %record.id, "remove-key for absent key");
                }
            }
        }

        self.last_change_id = record.id;
        Ok(())
    }

    /// Replays every journal record newer than the model.
    ///
    /// Returns the number of records applied.
    pub fn replay(&mut self, reader: &mut WalReader) -> CoreResult<usize> {
        let mut applied = 0;
        while let Some(record) = reader.next_record()? {
            if record.id > self.last_change_id {
                self.apply(&record)?;
                applied += 1;
            }
        }
        if applied > 0 {
            debug!(applied, version = %self.last_change_id, "journal replayed");
        }
        Ok(applied)
    }

    /// Inserts a node loaded from a snapshot.
    ///
    /// # Errors
    ///
    /// Fails with a snapshot corruption error on a duplicate key.
    pub(crate) fn insert_restored(&mut self, node: Node) -> CoreResult<()> {
        if node.last_change_id() > self.last_change_id {
            self.last_change_id = node.last_change_id();
        }
        let key = node.key().to_string();
        if self.nodes.insert(key.clone(), node).is_some() {
            return Err(CoreError::snapshot_corruption(format!(
                "duplicate key \"{key}\""
            )));
        }
        Ok(())
    }

    /// Raises the model's stamp to `id` (snapshot header restore).
    pub(crate) fn raise_last_change_id(&mut self, id: RecordId) {
        if id > self.last_change_id {
            self.last_change_id = id;
        }
    }
}
