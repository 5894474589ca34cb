//! Spindle Protocol - Shared value types for the record writer
//!
//! This crate provides the small types that flow between the writer, its
//! routing policies, the transport and the recovery log:
//! - `ChannelId` - Index of a logical output channel
//! - `Superstep` - Round number of a bulk-synchronous iteration
//! - `DatasetId` - Identifier of the produced intermediate dataset
//! - `TaskEvent` - Control events interleaved with records
//! - Record framing - length-prefixed records that survive buffer boundaries
//!
//! # Framing
//!
//! Every record is written as:
//!
//! ```text
//! [4-byte big-endian length][bincode payload]
//! ```
//!
//! The same framing is used inside network buffers and in recovery log
//! segments, so one reader handles both.

mod channel;
mod dataset;
mod error;
mod event;
mod framing;
mod superstep;

pub use channel::ChannelId;
pub use dataset::DatasetId;
pub use error::ProtocolError;
pub use event::TaskEvent;
pub use framing::{
    LENGTH_FIELD_SIZE, MAX_RECORD_SIZE, decode_record, encode_record, encode_record_to_vec,
    frame_length,
};
pub use superstep::Superstep;

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
