//! Spindle - Routing
//!
//! Channel selection policies: given a record and the number of output
//! channels, decide which channels receive it.
//!
//! # Design
//!
//! Every policy implements the single-method `ChannelSelector` trait, so the
//! record writer never needs to know which policy is installed.
//!
//! - `select_channels()` returns `&[ChannelId]` - a slice into storage owned
//!   by the selector, no allocation per record
//! - Selection is deterministic for a given record, channel count and
//!   selector state, which keeps replay after a failure reproducible
//!
//! # Example
//!
//! ```
//! use spindle_routing::{ChannelSelector, RoundRobin};
//! use spindle_protocol::ChannelId;
//!
//! let mut selector = RoundRobin::new();
//! assert_eq!(selector.select_channels(&"a", 3), &[ChannelId::new(0)]);
//! assert_eq!(selector.select_channels(&"b", 3), &[ChannelId::new(1)]);
//! ```

mod error;
mod partitioned;
mod selector;


pub use error::{Result, RoutingError};
pub use partitioned::KeyPartitioned;
pub use selector::{Broadcast, ChannelSelector, Forward, RoundRobin, check_selection};

// Re-export ChannelId for convenience
pub use spindle_protocol::ChannelId;
