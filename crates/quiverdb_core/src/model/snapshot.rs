//! Snapshot image: a materialised encoding of the whole model.
//!
//! ```text
//! u32 schema_version (= 1)
//! u64 last_change_id
//! node*                       # until end of file
//! ```
//!
//! Each node encodes as:
//!
//! ```text
//! u64 last_change_id
//! u32 key_len, key bytes
//! u32 value_count
//! { u32 value_len, value bytes }*
//! ```
//!
//! An empty file decodes to an empty model. An unknown schema version is
//! a fatal open error; a file torn inside a node is corruption.

use crate::error::{CoreError, CoreResult};
use crate::model::{Model, Node};
use crate::types::RecordId;
use quiverdb_codec::{ByteReader, ByteWriter, CodecError};

/// Current snapshot schema version. A version byte is reserved for
/// evolution; no migration is defined yet.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Encodes the model into its snapshot image.
///
/// Nodes are written in sorted key order, making the image deterministic
/// for a given model.
pub fn encode_model(model: &Model) -> CoreResult<Vec<u8>> {
    let mut w = ByteWriter::new();
    w.put_u32(SNAPSHOT_VERSION);
    w.put_u64(model.last_change_id().as_u64());

    for key in model.keys() {
        if let Some(node) = model.get(&key) {
            encode_node(&mut w, node)?;
        }
    }
    Ok(w.into_bytes())
}

fn encode_node(w: &mut ByteWriter, node: &Node) -> CoreResult<()> {
    w.put_u64(node.last_change_id().as_u64());
    w.put_bytes(node.key().as_bytes())?;
    let count = u32::try_from(node.values().len())
        .map_err(|_| CoreError::snapshot_corruption("node value count exceeds u32"))?;
    w.put_u32(count);
    for value in node.values() {
        w.put_bytes(value)?;
    }
    Ok(())
}

/// Decodes a snapshot image into a model.
///
/// # Errors
///
/// Fails with [`CoreError::SchemaMismatch`] on an unknown version and
/// with [`CoreError::SnapshotCorruption`] on duplicate keys or an image
/// torn inside a node.
pub fn decode_model(bytes: &[u8]) -> CoreResult<Model> {
    let mut model = Model::new();
    if bytes.is_empty() {
        return Ok(model);
    }

    let mut r = ByteReader::new(bytes);
    let version = r.u32()?;
    if version != SNAPSHOT_VERSION {
        return Err(CoreError::SchemaMismatch { version });
    }
    let last_change_id = r.u64()?;
    model.raise_last_change_id(RecordId::new(last_change_id));

    while !r.is_empty() {
        let node = decode_node(&mut r)?;
        model.insert_restored(node)?;
    }
    Ok(model)
}

fn decode_node(r: &mut ByteReader<'_>) -> CoreResult<Node> {
    let offset = r.position();
    let torn = |e: CodecError| {
        CoreError::snapshot_corruption(format!("node torn at offset {offset}: {e}"))
    };

    let last_change_id = RecordId::new(r.u64().map_err(torn)?);
    let key_bytes = r.bytes().map_err(torn)?;
    let key = std::str::from_utf8(key_bytes)
        .map_err(|_| CoreError::snapshot_corruption(format!("key at offset {offset} is not UTF-8")))?
        .to_string();
    if key.is_empty() {
        return Err(CoreError::snapshot_corruption(format!(
            "empty key at offset {offset}"
        )));
    }

    let count = r.u32().map_err(torn)? as usize;
    let mut values = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        values.push(r.bytes().map_err(torn)?.to_vec());
    }

    Ok(Node::from_parts(key, last_change_id, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TxId;
    use crate::wal::{RecordType, WalRecord};
    use proptest::prelude::*;

    fn model_with(entries: &[(&str, &[&[u8]])]) -> Model {
        let mut model = Model::new();
        let mut id = 0u64;
        for (key, values) in entries {
            for value in *values {
                id += 1;
                let mut record = WalRecord::new(RecordType::AddValue, *key, value.to_vec());
                record.id = RecordId::new(id);
                record.tx_id = TxId::new(1);
                model.apply(&record).unwrap();
            }
        }
        model
    }

    #[test]
    fn empty_file_decodes_to_empty_model() {
        let model = decode_model(&[]).unwrap();
        assert!(model.is_empty());
        assert_eq!(model.last_change_id(), RecordId::new(0));
    }

    #[test]
    fn round_trip_preserves_model() {
        let model = model_with(&[
            ("alpha", &[b"1", b"2", b"1"]),
            ("beta", &[b"x"]),
            ("gamma", &[]),
        ]);
        let bytes = encode_model(&model).unwrap();
        let decoded = decode_model(&bytes).unwrap();
        assert_eq!(model, decoded);
    }

    #[test]
    fn unknown_schema_version_fails() {
        let mut w = ByteWriter::new();
        w.put_u32(42);
        w.put_u64(0);
        assert!(matches!(
            decode_model(w.as_bytes()),
            Err(CoreError::SchemaMismatch { version: 42 })
        ));
    }

    #[test]
    fn version_survives_even_without_nodes() {
        let mut model = model_with(&[("k", &[b"v"])]);
        // Remove the only key; the version stays at the removal record.
        let mut record = WalRecord::new(RecordType::RemoveKey, "k", Vec::new());
        record.id = RecordId::new(2);
        model.apply(&record).unwrap();

        let decoded = decode_model(&encode_model(&model).unwrap()).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded.last_change_id(), RecordId::new(2));
    }

    #[test]
    fn duplicate_key_is_corruption() {
        let model = model_with(&[("k", &[b"v"])]);
        let mut bytes = encode_model(&model).unwrap();
        // Append the same node image again.
        let node_image = bytes[12..].to_vec();
        bytes.extend_from_slice(&node_image);

        assert!(matches!(
            decode_model(&bytes),
            Err(CoreError::SnapshotCorruption { .. })
        ));
    }

    #[test]
    fn torn_node_is_corruption() {
        let model = model_with(&[("key", &[b"value"])]);
        let bytes = encode_model(&model).unwrap();
        let truncated = &bytes[..bytes.len() - 3];

        assert!(matches!(
            decode_model(truncated),
            Err(CoreError::SnapshotCorruption { .. })
        ));
    }

    proptest! {
        #[test]
        fn encode_decode_round_trip(
            entries in proptest::collection::btree_map(
                "[a-z]{1,8}",
                proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..16), 1..4),
                0..8,
            )
        ) {
            let mut model = Model::new();
            let mut id = 0u64;
            for (key, values) in &entries {
                for value in values {
                    id += 1;
                    let mut record = WalRecord::new(RecordType::AddValue, key.clone(), value.clone());
                    record.id = RecordId::new(id);
                    model.apply(&record).unwrap();
                }
            }

            let decoded = decode_model(&encode_model(&model).unwrap()).unwrap();
            prop_assert_eq!(model, decoded);
        }
    }
}
