//! Channel selector contract and the built-in stateless-ish policies
//!
//! Selectors are consulted once per emitted record. They return a slice into
//! their own storage so the hot path performs no allocation.

use spindle_protocol::ChannelId;

use crate::{Result, RoutingError};

/// Maps a record to the ordered set of channels that must receive it
///
/// An empty slice means the record is dropped.
pub trait ChannelSelector<T: ?Sized>: Send {
    /// Select target channels for `record` among `num_channels` channels
    fn select_channels(&mut self, record: &T, num_channels: usize) -> &[ChannelId];
}

impl<T: ?Sized, S: ChannelSelector<T> + ?Sized> ChannelSelector<T> for Box<S> {
    #[inline]
    fn select_channels(&mut self, record: &T, num_channels: usize) -> &[ChannelId] {
        (**self).select_channels(record, num_channels)
    }
}

/// Verify every selected channel exists in a partition of `num_channels`
#[inline]
pub fn check_selection(channels: &[ChannelId], num_channels: usize) -> Result<()> {
    match channels.iter().find(|c| !c.is_within(num_channels)) {
        Some(&channel) => Err(RoutingError::out_of_range(channel, num_channels)),
        None => Ok(()),
    }
}

/// Default policy: one channel per record, cycling through all channels
///
/// The cursor advances on every call, so the first record goes to channel 0,
/// the second to channel 1, and so on.
#[derive(Debug, Clone, Default)]
pub struct RoundRobin {
    last: Option<usize>,
    selected: [ChannelId; 1],
}

impl RoundRobin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: ?Sized> ChannelSelector<T> for RoundRobin {
    fn select_channels(&mut self, _record: &T, num_channels: usize) -> &[ChannelId] {
        if num_channels == 0 {
            return &[];
        }

        let next = match self.last {
            Some(last) => (last + 1) % num_channels,
            None => 0,
        };
        self.last = Some(next);
        self.selected[0] = ChannelId::new(next as u16);
        &self.selected
    }
}

/// Deliver every record to every channel
#[derive(Debug, Clone, Default)]
pub struct Broadcast {
    all: Vec<ChannelId>,
}

impl Broadcast {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: ?Sized> ChannelSelector<T> for Broadcast {
    fn select_channels(&mut self, _record: &T, num_channels: usize) -> &[ChannelId] {
        // Rebuilt only when the channel count changes
        if self.all.len() != num_channels {
            self.all = (0..num_channels).map(|i| ChannelId::new(i as u16)).collect();
        }
        &self.all
    }
}

/// One-to-one routing: every record goes to a fixed channel
#[derive(Debug, Clone, Copy)]
pub struct Forward {
    selected: [ChannelId; 1],
}

impl Forward {
    #[must_use]
    pub const fn new(channel: ChannelId) -> Self {
        Self {
            selected: [channel],
        }
    }

    /// The channel every record is forwarded to
    pub const fn channel(&self) -> ChannelId {
        self.selected[0]
    }
}

impl<T: ?Sized> ChannelSelector<T> for Forward {
    fn select_channels(&mut self, _record: &T, num_channels: usize) -> &[ChannelId] {
        if num_channels == 0 {
            return &[];
        }
        &self.selected
    }
}
