//! Control events
//!
//! Events travel on the same channels as records but never inside a record
//! buffer. The writer flushes a channel's buffered records before handing
//! an event to the transport, so consumers observe events in submission
//! order relative to data.

use bytes::Bytes;

use crate::Superstep;

/// A control event delivered in-order with records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// Application-defined event with an opaque payload
    Application {
        /// Event kind, interpreted by the consumer
        kind: String,
        /// Opaque event payload
        payload: Bytes,
    },

    /// Marks the end of a superstep on one channel
    EndOfSuperstep,

    /// Checkpoint barrier aligned with the data stream
    CheckpointBarrier {
        /// Checkpoint identifier
        checkpoint_id: u64,
        /// Superstep the barrier belongs to, if iterating
        superstep: Option<Superstep>,
    },
}

impl TaskEvent {
    /// Create an application event
    pub fn application(kind: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self::Application {
            kind: kind.into(),
            payload: payload.into(),
        }
    }

    /// Create a checkpoint barrier
    pub fn barrier(checkpoint_id: u64, superstep: Option<Superstep>) -> Self {
        Self::CheckpointBarrier {
            checkpoint_id,
            superstep,
        }
    }

    /// Check if this event separates supersteps or checkpoints
    pub fn is_barrier(&self) -> bool {
        matches!(self, Self::EndOfSuperstep | Self::CheckpointBarrier { .. })
    }

    /// Short name for logging
    pub fn name(&self) -> &str {
        match self {
            Self::Application { kind, .. } => kind,
            Self::EndOfSuperstep => "end_of_superstep",
            Self::CheckpointBarrier { .. } => "checkpoint_barrier",
        }
    }
}
