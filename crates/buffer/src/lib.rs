//! Spindle - Buffers
//!
//! Fixed-capacity network buffers handed out by a bounded pool.
//!
//! # Ownership
//!
//! A `Buffer` has exactly one owner at a time: the serializer filling it,
//! then the transport once the writer hands it over. When the owner drops
//! it (or calls `recycle()`), its memory goes back to the pool. Because
//! `Buffer` is not `Clone`, a buffer is returned exactly once per
//! acquisition and can never be touched after it was handed on.
//!
//! # Backpressure
//!
//! The pool never grows. When every buffer is out, `request_buffer_blocking`
//! parks the caller until one is recycled or the pool is destroyed.
//!
//! ```
//! use spindle_buffer::BufferPool;
//!
//! let pool = BufferPool::new(2, 64).unwrap();
//! let mut buf = pool.request_buffer_blocking().unwrap();
//! assert_eq!(buf.append(b"hello"), 5);
//! assert_eq!(pool.outstanding(), 1);
//!
//! drop(buf);
//! assert_eq!(pool.outstanding(), 0);
//! ```

mod buffer;
mod error;
mod pool;

pub use buffer::Buffer;
pub use error::{BufferError, Result};
pub use pool::{BufferPool, BufferPoolMetrics, MetricsSnapshot};

/// Default buffer size (32KB)
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Default number of buffers per pool
pub const DEFAULT_POOL_SIZE: usize = 64;
