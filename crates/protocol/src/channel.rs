//! Channel identifier type
//!
//! `ChannelId` names one logical output path from a producing task to a
//! consuming subpartition. It is `Copy` and small so selectors can hand out
//! slices of them without allocating.

use std::fmt;

/// Index of an output channel in `[0, num_channels)`
///
/// # Example
///
/// ```
/// use spindle_protocol::ChannelId;
///
/// let channel = ChannelId::new(2);
/// assert_eq!(channel.as_usize(), 2);
/// assert_eq!(channel.to_string(), "channel:2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChannelId(u16);

impl ChannelId {
    /// Maximum number of channels supported
    pub const MAX: u16 = u16::MAX;

    /// Create a new channel ID from a numeric index
    #[inline]
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Get the numeric index of this channel
    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        self.0
    }

    /// Get the index as usize (for array indexing)
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Convert a usize index, returning `None` if it exceeds `MAX`
    #[inline]
    pub fn from_usize(index: usize) -> Option<Self> {
        u16::try_from(index).ok().map(Self)
    }

    /// Check whether this channel exists in a partition of `num_channels`
    #[inline]
    pub const fn is_within(self, num_channels: usize) -> bool {
        (self.0 as usize) < num_channels
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel:{}", self.0)
    }
}

impl From<u16> for ChannelId {
    #[inline]
    fn from(index: u16) -> Self {
        Self::new(index)
    }
}

impl From<ChannelId> for u16 {
    #[inline]
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

impl From<ChannelId> for usize {
    #[inline]
    fn from(id: ChannelId) -> Self {
        id.0 as usize
    }
}
