//! Journal record types and binary layout.

use crate::error::{CoreError, CoreResult};
use crate::types::{RecordId, TxId};
use quiverdb_codec::{ByteReader, ByteWriter};

/// Current journal format version.
pub const WAL_VERSION: u32 = 1;

/// Byte length of the journal file header (`u32` version).
pub const WAL_HEADER_LEN: u64 = 4;

/// Byte length of the fixed record header:
/// id (8) + txID (8) + type (1) + key_len (4) + value_len (4).
pub const RECORD_HEADER_LEN: usize = 25;

/// Encodes the journal file header for an empty journal.
#[must_use]
pub fn encode_wal_header() -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(WAL_HEADER_LEN as usize);
    w.put_u32(WAL_VERSION);
    w.into_bytes()
}

/// Type of a journal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    /// An empty record. Advances the model version without touching data.
    None = 0,
    /// Appends a value to a key, creating the node if absent.
    AddValue = 1,
    /// Removes the first occurrence of a value from a key.
    RemoveValue = 2,
    /// Removes a key and all its values.
    RemoveKey = 3,
    /// Commit marker terminating a transaction. Writer-managed.
    CommitTx = 4,
}

impl RecordType {
    /// Converts a byte to a record type.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::None),
            1 => Some(Self::AddValue),
            2 => Some(Self::RemoveValue),
            3 => Some(Self::RemoveKey),
            4 => Some(Self::CommitTx),
            _ => None,
        }
    }

    /// Converts the record type to its byte form.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns `true` for the types allowed to carry an empty key.
    #[must_use]
    pub const fn allows_empty_key(self) -> bool {
        matches!(self, Self::None | Self::CommitTx)
    }
}

/// A single journal record.
///
/// `id` and `tx_id` are assigned by the [`super::WalWriter`] when the
/// record is written; records under construction leave them at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    /// Record id, unique and strictly increasing within the file.
    pub id: RecordId,
    /// Transaction this record belongs to.
    pub tx_id: TxId,
    /// Operation kind.
    pub record_type: RecordType,
    /// Target key; empty only for `None` and `CommitTx`.
    pub key: String,
    /// Value payload; meaningful for `AddValue` / `RemoveValue`.
    pub value: Vec<u8>,
}

impl WalRecord {
    /// Creates a record awaiting id assignment by the writer.
    #[must_use]
    pub fn new(record_type: RecordType, key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            id: RecordId::default(),
            tx_id: TxId::default(),
            record_type,
            key: key.into(),
            value,
        }
    }

    /// Creates the commit marker the writer appends on commit.
    #[must_use]
    pub(crate) fn commit_marker() -> Self {
        Self::new(RecordType::CommitTx, "", Vec::new())
    }

    /// Returns the encoded byte length of this record.
    #[must_use]
    pub fn encoded_len(&self) -> u64 {
        RECORD_HEADER_LEN as u64 + self.key.len() as u64 + self.value.len() as u64
    }

    /// Encodes the record into its on-disk form.
    ///
    /// # Errors
    ///
    /// Fails if the key or value exceeds the `u32` length fields, or if a
    /// keyed record type carries an empty key.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        if self.key.is_empty() && !self.record_type.allows_empty_key() {
            return Err(CoreError::invalid_record(format!(
                "record type {:?} requires a key",
                self.record_type
            )));
        }
        let key_len = u32::try_from(self.key.len())
            .map_err(|_| CoreError::invalid_record("key exceeds u32 length field"))?;
        let value_len = u32::try_from(self.value.len())
            .map_err(|_| CoreError::invalid_record("value exceeds u32 length field"))?;

        let mut w = ByteWriter::with_capacity(self.encoded_len() as usize);
        w.put_u64(self.id.as_u64());
        w.put_u64(self.tx_id.as_u64());
        w.put_u8(self.record_type.as_byte());
        w.put_u32(key_len);
        w.put_u32(value_len);
        w.put_raw(self.key.as_bytes());
        w.put_raw(&self.value);
        Ok(w.into_bytes())
    }

    /// Decodes a record from a complete byte image.
    ///
    /// The image must contain exactly one record (header + key + value),
    /// as assembled by the reader from the length fields.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        let mut r = ByteReader::new(bytes);
        let id = RecordId::new(r.u64()?);
        let tx_id = TxId::new(r.u64()?);
        let type_byte = r.u8()?;
        let record_type =
            RecordType::from_byte(type_byte).ok_or(CoreError::UnknownRecordType { code: type_byte })?;
        let key_len = r.u32()? as usize;
        let value_len = r.u32()? as usize;
        let key = r.utf8(key_len)?.to_string();
        let value = r.raw(value_len)?.to_vec();

        if key.is_empty() && !record_type.allows_empty_key() {
            return Err(CoreError::invalid_record(format!(
                "record {id} of type {record_type:?} has an empty key"
            )));
        }

        Ok(Self {
            id,
            tx_id,
            record_type,
            key,
            value,
        })
    }

    /// Decodes the two length fields out of a record header.
    ///
    /// Used to compute how many payload bytes follow the fixed header.
    pub(crate) fn decode_body_len(header: &[u8]) -> CoreResult<u64> {
        let mut r = ByteReader::new(header);
        let _id = r.u64()?;
        let _tx_id = r.u64()?;
        let _type = r.u8()?;
        let key_len = r.u32()?;
        let value_len = r.u32()?;
        Ok(u64::from(key_len) + u64::from(value_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn type_bytes_round_trip() {
        for t in [
            RecordType::None,
            RecordType::AddValue,
            RecordType::RemoveValue,
            RecordType::RemoveKey,
            RecordType::CommitTx,
        ] {
            assert_eq!(RecordType::from_byte(t.as_byte()), Some(t));
        }
        assert_eq!(RecordType::from_byte(9), None);
    }

    #[test]
    fn layout_is_fixed() {
        let mut record = WalRecord::new(RecordType::AddValue, "ab", vec![0xCC]);
        record.id = RecordId::new(0x0102);
        record.tx_id = TxId::new(3);

        let bytes = record.encode().unwrap();
        assert_eq!(bytes.len() as u64, record.encoded_len());
        assert_eq!(bytes.len(), 25 + 2 + 1);
        // id, little-endian
        assert_eq!(&bytes[0..8], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        // txID
        assert_eq!(&bytes[8..16], &[3, 0, 0, 0, 0, 0, 0, 0]);
        // type
        assert_eq!(bytes[16], 1);
        // key_len, value_len
        assert_eq!(&bytes[17..21], &[2, 0, 0, 0]);
        assert_eq!(&bytes[21..25], &[1, 0, 0, 0]);
        // key then value
        assert_eq!(&bytes[25..27], b"ab");
        assert_eq!(bytes[27], 0xCC);
    }

    #[test]
    fn commit_marker_has_no_payload() {
        let marker = WalRecord::commit_marker();
        assert_eq!(marker.record_type, RecordType::CommitTx);
        assert!(marker.key.is_empty());
        assert!(marker.value.is_empty());
        assert_eq!(marker.encoded_len(), RECORD_HEADER_LEN as u64);
    }

    #[test]
    fn keyed_record_with_empty_key_is_rejected() {
        let record = WalRecord::new(RecordType::AddValue, "", vec![1]);
        assert!(matches!(
            record.encode(),
            Err(CoreError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn unknown_type_byte_fails_decode() {
        let mut record = WalRecord::new(RecordType::None, "", Vec::new());
        record.id = RecordId::new(1);
        let mut bytes = record.encode().unwrap();
        bytes[16] = 0x7F;

        assert!(matches!(
            WalRecord::decode(&bytes),
            Err(CoreError::UnknownRecordType { code: 0x7F })
        ));
    }

    #[test]
    fn header_encodes_version_one() {
        assert_eq!(encode_wal_header(), vec![1, 0, 0, 0]);
    }

    proptest! {
        #[test]
        fn encode_decode_round_trip(
            id in 1u64..u64::MAX,
            tx in 1u64..u64::MAX,
            key in "[a-z0-9/._-]{1,32}",
            value in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let mut record = WalRecord::new(RecordType::AddValue, key, value);
            record.id = RecordId::new(id);
            record.tx_id = TxId::new(tx);

            let bytes = record.encode().unwrap();
            let decoded = WalRecord::decode(&bytes).unwrap();
            prop_assert_eq!(record, decoded);
        }
    }
}
