//! Spanning record serializer
//!
//! One serializer exists per output channel. A record is first encoded into
//! a scratch frame (`[length][payload]`), then copied into the current
//! buffer. When the buffer cannot hold the rest of the frame the serializer
//! reports a full buffer and keeps a cursor into the frame; the caller
//! forwards the buffer and hands over the next one with `set_next_buffer`,
//! which continues the copy. A frame can span any number of buffers.
//!
//! ```text
//! frame:   [len|..........payload..........]
//!           \_____ buf 1 _____/\__ buf 2 __/
//! ```

use serde::Serialize;
use spindle_buffer::Buffer;
use spindle_protocol::encode_record;

use crate::error::{Result, WriterError};

/// Outcome of appending data to the current buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationResult {
    /// The whole record fits and the buffer still has room
    FullRecord,
    /// The whole record fits and exactly fills the buffer
    FullRecordBufferFull,
    /// Only part of the record fits; a new buffer is needed to continue
    PartialRecordBufferFull,
}

impl SerializationResult {
    /// Whether the current buffer must be flushed before more data fits
    #[inline]
    pub fn is_full_buffer(self) -> bool {
        !matches!(self, Self::FullRecord)
    }

    /// Whether the record has been completely copied
    #[inline]
    pub fn is_full_record(self) -> bool {
        !matches!(self, Self::PartialRecordBufferFull)
    }
}

/// Per-channel serializer that spans records across fixed-size buffers
#[derive(Debug, Default)]
pub struct SpanningRecordSerializer {
    /// Frame of the most recent record
    frame: Vec<u8>,
    /// Bytes of `frame` already copied into buffers
    position: usize,
    buffer: Option<Buffer>,
}

impl SpanningRecordSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `record` and copy as much of it as fits into the current buffer
    ///
    /// Without a current buffer nothing is copied and the result is
    /// `PartialRecordBufferFull`. Fails with `IllegalState` if the previous
    /// record has not been completely copied yet; on an encoding error the
    /// serializer is left without pending data.
    pub fn add_record<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<SerializationResult> {
        self.start_frame()?;
        if let Err(e) = encode_record(record, &mut self.frame) {
            self.frame.clear();
            return Err(WriterError::Serialization(e));
        }
        Ok(self.copy_to_buffer())
    }

    /// Copy an already framed record, as produced by `encode_record`
    pub fn add_frame(&mut self, frame: &[u8]) -> Result<SerializationResult> {
        self.start_frame()?;
        self.frame.extend_from_slice(frame);
        Ok(self.copy_to_buffer())
    }

    fn start_frame(&mut self) -> Result<()> {
        if self.has_data() {
            return Err(WriterError::illegal_state(format!(
                "{} bytes of the previous record are still pending",
                self.pending()
            )));
        }
        self.frame.clear();
        self.position = 0;
        Ok(())
    }

    /// Install the next buffer and continue copying any pending remainder
    ///
    /// A buffer still held by the serializer is dropped, which recycles it.
    pub fn set_next_buffer(&mut self, buffer: Buffer) -> SerializationResult {
        self.buffer = Some(buffer);
        self.copy_to_buffer()
    }

    fn copy_to_buffer(&mut self) -> SerializationResult {
        let Some(buffer) = self.buffer.as_mut() else {
            return if self.has_data() {
                SerializationResult::PartialRecordBufferFull
            } else {
                SerializationResult::FullRecordBufferFull
            };
        };

        self.position += buffer.append(&self.frame[self.position..]);
        match (self.position == self.frame.len(), buffer.is_full()) {
            (true, false) => SerializationResult::FullRecord,
            (true, true) => SerializationResult::FullRecordBufferFull,
            (false, _) => SerializationResult::PartialRecordBufferFull,
        }
    }

    /// Current buffer, if any
    pub fn current_buffer(&self) -> Option<&Buffer> {
        self.buffer.as_ref()
    }

    /// Take ownership of the current buffer, leaving none installed
    pub fn take_current_buffer(&mut self) -> Option<Buffer> {
        self.buffer.take()
    }

    /// Whether part of the last record still waits for a buffer
    #[inline]
    pub fn has_data(&self) -> bool {
        self.position < self.frame.len()
    }

    /// Number of bytes of the last record not yet copied
    #[inline]
    pub fn pending(&self) -> usize {
        self.frame.len() - self.position
    }

    /// Frame of the most recently added record
    pub fn last_frame(&self) -> &[u8] {
        &self.frame
    }

    /// Drop pending data and recycle the current buffer without forwarding it
    ///
    /// Returns true if a buffer was recycled.
    pub fn clear(&mut self) -> bool {
        self.frame.clear();
        self.position = 0;
        self.buffer.take().map(Buffer::recycle).is_some()
    }
}
