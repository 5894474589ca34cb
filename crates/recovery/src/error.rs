//! Recovery error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for recovery log operations
pub type Result<T> = std::result::Result<T, RecoveryError>;

/// Errors raised by recovery log files and tooling
///
/// The record writer never propagates these; they surface from the
/// segment tooling and are logged by `RecoveryLog`.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// File system operation failed
    #[error("recovery log i/o failed for '{}': {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// A frame in a segment is corrupt
    #[error("corrupt frame in '{}': {message}", path.display())]
    CorruptFrame {
        /// Segment file
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Replay parameters cannot describe a real partition
    #[error("invalid replay filter: {0}")]
    InvalidReplay(String),

    /// Stored record payload could not be decoded
    #[error("failed to decode logged record: {0}")]
    Decode(#[from] spindle_protocol::ProtocolError),
}

impl RecoveryError {
    /// Create an Io error
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a CorruptFrame error
    #[inline]
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptFrame {
            path: path.into(),
            message: message.into(),
        }
    }
}
