//! Record deserializer
//!
//! Reassembles the records of one channel from the buffers it received, in
//! order. Record boundaries come from the length field alone, so a record
//! may start in one buffer and end several buffers later.

use bytes::{Buf, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use spindle_protocol::{LENGTH_FIELD_SIZE, decode_record, frame_length};

use crate::error::Result;

/// Incremental reader for the framed byte stream of one channel
#[derive(Debug, Default)]
pub struct RecordDeserializer {
    pending: BytesMut,
}

impl RecordDeserializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the contents of the next buffer of the channel
    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Take the next complete record payload, if one is buffered
    pub fn next_frame(&mut self) -> Option<Bytes> {
        if self.pending.len() < LENGTH_FIELD_SIZE {
            return None;
        }

        let mut header = [0u8; LENGTH_FIELD_SIZE];
        header.copy_from_slice(&self.pending[..LENGTH_FIELD_SIZE]);
        let len = frame_length(header);
        if self.pending.len() - LENGTH_FIELD_SIZE < len {
            return None;
        }

        self.pending.advance(LENGTH_FIELD_SIZE);
        Some(self.pending.split_to(len).freeze())
    }

    /// Decode the next complete record, if one is buffered
    pub fn next_record<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.next_frame() {
            Some(payload) => Ok(Some(decode_record(&payload)?)),
            None => Ok(None),
        }
    }

    /// Decode every complete record currently buffered
    pub fn drain_records<T: DeserializeOwned>(&mut self) -> Result<Vec<T>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(records)
    }

    /// Whether buffered bytes remain after draining complete records
    ///
    /// True at the end of a stream means the last record was cut short.
    pub fn has_partial_record(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Bytes buffered but not yet returned
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }
}
