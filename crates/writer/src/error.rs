//! Writer error types

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

use spindle_buffer::BufferError;
use spindle_protocol::{ChannelId, ProtocolError};
use spindle_routing::RoutingError;

/// Result type for record writer operations
pub type Result<T> = std::result::Result<T, WriterError>;

/// Errors surfaced by the record writer
///
/// Any of these aborts the producing task. Recovery log failures are never
/// reported here.
#[derive(Debug, Error)]
pub enum WriterError {
    /// Record could not be encoded; nothing was appended to any buffer
    #[error("record serialization failed: {0}")]
    Serialization(#[from] ProtocolError),

    /// The result partition failed to accept a buffer, event or marker
    #[error("transport write failed on {target}: {source}")]
    Transport {
        target: TransportTarget,
        #[source]
        source: io::Error,
    },

    /// The buffer pool was destroyed while the writer waited for a buffer
    #[error("buffer pool destroyed")]
    PoolDestroyed,

    /// No buffer became available within the configured request timeout
    #[error("no buffer available within {0:?}")]
    BufferTimeout(Duration),

    /// Channel selection produced an index outside the partition
    #[error("channel {channel} out of range for {num_channels} channels")]
    ChannelOutOfRange {
        channel: ChannelId,
        num_channels: usize,
    },

    /// Internal invariant broken; not retryable
    #[error("illegal writer state: {0}")]
    IllegalState(String),

    /// A messaging context handed out its edges twice
    #[error("outgoing edges already used for this vertex")]
    EdgesAlreadyUsed,
}

/// What a failed transport write was addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportTarget {
    Channel(ChannelId),
    /// Partition-wide signals such as end-of-superstep
    Partition,
}

impl fmt::Display for TransportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(channel) => write!(f, "{channel}"),
            Self::Partition => f.write_str("partition"),
        }
    }
}

impl WriterError {
    /// Create a Transport error for one channel
    #[inline]
    pub fn transport(channel: ChannelId, source: io::Error) -> Self {
        Self::Transport {
            target: TransportTarget::Channel(channel),
            source,
        }
    }

    /// Create a Transport error for a partition-wide signal
    #[inline]
    pub fn partition_transport(source: io::Error) -> Self {
        Self::Transport {
            target: TransportTarget::Partition,
            source,
        }
    }

    /// Create an IllegalState error
    #[inline]
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState(message.into())
    }
}

impl From<BufferError> for WriterError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::PoolDestroyed => Self::PoolDestroyed,
            other => Self::IllegalState(other.to_string()),
        }
    }
}

impl From<RoutingError> for WriterError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::ChannelOutOfRange {
                channel,
                num_channels,
            } => Self::ChannelOutOfRange {
                channel,
                num_channels,
            },
            other => Self::IllegalState(other.to_string()),
        }
    }
}
