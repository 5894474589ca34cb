//! Buffer pool error types

use thiserror::Error;

/// Result type for buffer pool operations
pub type Result<T> = std::result::Result<T, BufferError>;

/// Errors returned by the buffer pool
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    /// The pool was destroyed while or before requesting
    #[error("buffer pool has been destroyed")]
    PoolDestroyed,

    /// Pool dimensions are unusable
    #[error("invalid buffer pool: {num_buffers} buffers of {buffer_size} bytes")]
    InvalidPool {
        /// Requested number of buffers
        num_buffers: usize,
        /// Requested buffer size
        buffer_size: usize,
    },
}
