//! Spindle - Recovery
//!
//! Best-effort side logging of outgoing records, and the replay filter used
//! when a task is restarted after a node loss.
//!
//! # Architecture
//!
//! ```text
//! [RecordWriter::emit] --frame--> [RecoveryLog] --per channel--> [SegmentWriter]
//!                                      |                               |
//!                               superstep changed?              <dir>/<dataset>_<channel>_<superstep>.log
//!                                      ↓
//!                              rotate to a new segment
//! ```
//!
//! # Segment format
//!
//! A segment is a plain sequence of framed records:
//!
//! ```text
//! [4-byte big-endian length][payload] [4-byte big-endian length][payload] ...
//! ```
//!
//! Failures in the log are warned about (rate-limited) and swallowed. The
//! log is a recovery aid; it must never fail the data path.

mod error;
mod filter;
mod rate_limited_logger;
mod reader;
mod segment;
mod sink;
mod writer;

pub use error::{RecoveryError, Result};
pub use filter::{MAX_PARALLELISM, ReplayFilter};
pub use rate_limited_logger::{DEFAULT_LOG_INTERVAL, RateLimitedLogger};
pub use reader::{FrameIterator, RecoveryLogReader};
pub use segment::{SEGMENT_EXTENSION, SEGMENT_PREFIX, SegmentInfo, list_segments, segment_path};
pub use sink::{LogOutcome, RecoveryLog, RecoveryLogConfig};
pub use writer::SegmentWriter;
