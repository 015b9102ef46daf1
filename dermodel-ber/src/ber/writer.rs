//! DER output buffer
//!
//! Values are assembled bottom-up: a node's content is written to its own
//! writer first, so the length is known when the enclosing TLV is emitted.
//! Every length is written in the minimal definite form.

use crate::ber::types::{BerLength, BerTag};
use bytes::{BufMut, Bytes, BytesMut};

#[derive(Debug, Default)]
pub struct BerWriter {
    buffer: BytesMut,
}

impl BerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Append a complete TLV
    pub fn write_tlv(&mut self, tag: BerTag, content: &[u8]) {
        self.buffer.put_slice(&tag.encode());
        self.buffer.put_slice(&BerLength::new(content.len()).encode());
        self.buffer.put_slice(content);
    }

    /// Append bytes that are already DER encoded
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer.put_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn freeze(self) -> Bytes {
        self.buffer.freeze()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buffer.to_vec()
    }
}

/// One TLV as a standalone byte vector
pub fn tlv(tag: BerTag, content: &[u8]) -> Vec<u8> {
    let mut writer = BerWriter::with_capacity(content.len() + 4);
    writer.write_tlv(tag, content);
    writer.into_vec()
}
