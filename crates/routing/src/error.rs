//! Routing error types

use thiserror::Error;

use spindle_protocol::ChannelId;

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors that can occur when validating a channel selection
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Selector produced a channel the partition does not have
    #[error("{channel} is out of range for {num_channels} channels")]
    ChannelOutOfRange {
        /// Offending channel
        channel: ChannelId,
        /// Channel count of the partition
        num_channels: usize,
    },

    /// Channel count cannot be addressed by `ChannelId`
    #[error("{requested} channels requested, at most {max} supported")]
    TooManyChannels {
        /// Requested channel count
        requested: usize,
        /// Largest supported channel count
        max: usize,
    },
}

impl RoutingError {
    /// Create a ChannelOutOfRange error
    #[inline]
    pub fn out_of_range(channel: ChannelId, num_channels: usize) -> Self {
        Self::ChannelOutOfRange {
            channel,
            num_channels,
        }
    }

    /// Create a TooManyChannels error
    #[inline]
    pub fn too_many_channels(requested: usize) -> Self {
        Self::TooManyChannels {
            requested,
            max: usize::from(ChannelId::MAX) + 1,
        }
    }
}
