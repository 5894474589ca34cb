//! Key-partitioned routing
//!
//! Hashes a key extracted from each record with SeaHash. SeaHash has fixed
//! keys, so the same key maps to the same channel in every process, which
//! replay after a node loss depends on.

use std::fmt;
use std::hash::{Hash, Hasher};

use seahash::SeaHasher;
use spindle_protocol::ChannelId;

use crate::ChannelSelector;

/// Route each record to `hash(key) % num_channels`
///
/// # Example
///
/// ```
/// use spindle_routing::{ChannelSelector, KeyPartitioned};
///
/// let mut selector = KeyPartitioned::new(|edge: &(u64, u64)| edge.0);
/// let first = selector.select_channels(&(42, 1), 8).to_vec();
/// let again = selector.select_channels(&(42, 9), 8).to_vec();
/// assert_eq!(first, again);
/// ```
pub struct KeyPartitioned<F> {
    key_fn: F,
    selected: [ChannelId; 1],
}

impl<F> KeyPartitioned<F> {
    pub fn new(key_fn: F) -> Self {
        Self {
            key_fn,
            selected: [ChannelId::new(0)],
        }
    }
}

impl<F> fmt::Debug for KeyPartitioned<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPartitioned").finish_non_exhaustive()
    }
}

/// Channel a key hashes to among `num_channels` channels
#[inline]
pub(crate) fn channel_for_key<K: Hash + ?Sized>(key: &K, num_channels: usize) -> ChannelId {
    let mut hasher = SeaHasher::new();
    key.hash(&mut hasher);
    ChannelId::new((hasher.finish() % num_channels as u64) as u16)
}

impl<T, K, F> ChannelSelector<T> for KeyPartitioned<F>
where
    T: ?Sized,
    K: Hash,
    F: Fn(&T) -> K + Send,
{
    fn select_channels(&mut self, record: &T, num_channels: usize) -> &[ChannelId] {
        if num_channels == 0 {
            return &[];
        }
        self.selected[0] = channel_for_key(&(self.key_fn)(record), num_channels);
        &self.selected
    }
}
