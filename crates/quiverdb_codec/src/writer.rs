//! Append-only buffer writer for little-endian binary data.

use crate::error::{CodecError, CodecResult};

/// An append-only buffer for encoding little-endian binary data.
///
/// The writer never fails on integer appends; only length-prefixed byte
/// strings can fail, when their length does not fit the `u32` prefix.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    /// Creates a new empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Creates a writer with the given capacity pre-allocated.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Appends a single byte.
    pub fn put_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Appends a `u16` in little-endian order.
    pub fn put_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a `u32` in little-endian order.
    pub fn put_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a `u64` in little-endian order.
    pub fn put_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends raw bytes without a length prefix.
    pub fn put_raw(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Appends a length-prefixed byte string (`u32` length, then the bytes).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::LengthOverflow`] if `data` is longer than
    /// `u32::MAX` bytes.
    pub fn put_bytes(&mut self, data: &[u8]) -> CodecResult<()> {
        let len = u32::try_from(data.len())
            .map_err(|_| CodecError::LengthOverflow { len: data.len() })?;
        self.put_u32(len);
        self.put_raw(data);
        Ok(())
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer and returns the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        let mut w = ByteWriter::new();
        w.put_u8(0xAB);
        w.put_u16(0x0102);
        w.put_u32(0x0304_0506);
        w.put_u64(0x0708_090A_0B0C_0D0E);

        assert_eq!(
            w.as_bytes(),
            &[
                0xAB, // u8
                0x02, 0x01, // u16
                0x06, 0x05, 0x04, 0x03, // u32
                0x0E, 0x0D, 0x0C, 0x0B, 0x0A, 0x09, 0x08, 0x07, // u64
            ]
        );
    }

    #[test]
    fn length_prefixed_bytes() {
        let mut w = ByteWriter::new();
        w.put_bytes(b"abc").unwrap();
        assert_eq!(w.as_bytes(), &[3, 0, 0, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn empty_byte_string() {
        let mut w = ByteWriter::new();
        w.put_bytes(b"").unwrap();
        assert_eq!(w.as_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn raw_bytes_have_no_prefix() {
        let mut w = ByteWriter::new();
        w.put_raw(b"xyz");
        assert_eq!(w.as_bytes(), b"xyz");
        assert_eq!(w.len(), 3);
    }
}
