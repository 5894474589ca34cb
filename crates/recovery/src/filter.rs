//! Selective replay after a node loss
//!
//! When a task restarts after losing one node, only records that originally
//! went to the lost node need to be produced again. The filter re-runs the
//! channel selection against the parallelism the job had before the loss
//! and keeps a record only if its first target was the lost channel.
//!
//! Round-robin selection depends on call order, so it replays exactly only
//! while the channel count is unchanged; key-partitioned selection replays
//! across any change of parallelism.

use spindle_protocol::{ChannelId, Superstep};

use crate::error::{RecoveryError, Result};

/// Widest partition a channel index can address
pub const MAX_PARALLELISM: usize = ChannelId::MAX as usize + 1;

/// Replay filter for a restarted producer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayFilter {
    /// Channel that was served by the lost node
    pub lost_channel: ChannelId,
    /// Last superstep that has to be replayed
    pub end_superstep: Superstep,
    /// Number of channels before the failure
    pub original_parallelism: usize,
}

impl ReplayFilter {
    /// Build a filter for `lost_channel` of a partition that had
    /// `original_parallelism` channels
    ///
    /// Fails if the parallelism is zero, exceeds `MAX_PARALLELISM`, or does
    /// not contain the lost channel.
    pub fn new(
        lost_channel: ChannelId,
        end_superstep: Superstep,
        original_parallelism: usize,
    ) -> Result<Self> {
        if original_parallelism == 0 || original_parallelism > MAX_PARALLELISM {
            return Err(RecoveryError::InvalidReplay(format!(
                "original parallelism {original_parallelism} must be within 1..={MAX_PARALLELISM}"
            )));
        }
        if !lost_channel.is_within(original_parallelism) {
            return Err(RecoveryError::InvalidReplay(format!(
                "{lost_channel} is out of range for parallelism {original_parallelism}"
            )));
        }
        Ok(Self {
            lost_channel,
            end_superstep,
            original_parallelism,
        })
    }

    /// Whether the filter applies to records emitted in `superstep`
    ///
    /// Records emitted outside any iteration are always filtered.
    #[inline]
    pub fn is_active(&self, superstep: Option<Superstep>) -> bool {
        superstep.is_none_or(|step| step <= self.end_superstep)
    }

    /// Whether a record whose original selection was `selected` must be replayed
    #[inline]
    pub fn keeps(&self, selected: &[ChannelId]) -> bool {
        selected.first() == Some(&self.lost_channel)
    }
}
