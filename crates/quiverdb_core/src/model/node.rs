//! A single key's node: its ordered values and change stamp.

use crate::types::RecordId;
use crate::wal::{RecordType, WalRecord};

/// An opaque value held under a key. Equality is byte-wise.
pub type Value = Vec<u8>;

/// The in-memory state of one key.
///
/// A node holds an ordered multiset of values: duplicates are allowed and
/// insertion order is preserved. `last_change_id` stamps the newest
/// journal record applied to this node and never exceeds the model's own
/// stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    key: String,
    last_change_id: RecordId,
    values: Vec<Value>,
}

impl Node {
    /// Creates an empty node for `key`.
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            last_change_id: RecordId::default(),
            values: Vec::new(),
        }
    }

    /// Reassembles a node from its persisted parts.
    pub(crate) fn from_parts(key: String, last_change_id: RecordId, values: Vec<Value>) -> Self {
        Self {
            key,
            last_change_id,
            values,
        }
    }

    /// Returns the node's key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the id of the newest record applied to this node.
    #[must_use]
    pub fn last_change_id(&self) -> RecordId {
        self.last_change_id
    }

    /// Returns the node's values in insertion order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns `true` if the node holds a value equal to `value`.
    #[must_use]
    pub fn contains(&self, value: &[u8]) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Counts the occurrences of `value`.
    #[must_use]
    pub fn count_of(&self, value: &[u8]) -> usize {
        self.values.iter().filter(|v| *v == value).count()
    }

    /// Applies a journal record to this node.
    ///
    /// A record no newer than the node's stamp is ignored silently, which
    /// makes replay idempotent at the node level.
    pub(crate) fn apply(&mut self, record: &WalRecord) {
        if record.id <= self.last_change_id {
            return;
        }

        match record.record_type {
            RecordType::None | RecordType::CommitTx => {}
            RecordType::AddValue => self.values.push(record.value.clone()),
            RecordType::RemoveValue => {
                self.remove_first(&record.value);
            }
            RecordType::RemoveKey => self.values.clear(),
        }

        self.last_change_id = record.id;
    }

    /// Removes the first occurrence of `value` in insertion order.
    fn remove_first(&mut self, value: &[u8]) -> bool {
        match self.values.iter().position(|v| v == value) {
            Some(index) => {
                self.values.remove(index);
                true
            }
            None => false,
        }
    }
}
