//! Fixed-capacity buffer leased from a `BufferPool`

use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;

use crate::pool::PoolInner;

/// A fixed-capacity byte region leased from a pool
///
/// The buffer never reallocates: `append` writes at most `remaining()`
/// bytes. Dropping the buffer returns its memory to the pool.
pub struct Buffer {
    data: BytesMut,
    capacity: usize,
    pool: Arc<PoolInner>,
}

impl Buffer {
    pub(crate) fn new(data: BytesMut, capacity: usize, pool: Arc<PoolInner>) -> Self {
        Self {
            data,
            capacity,
            pool,
        }
    }

    /// Fixed capacity of this buffer in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes written so far
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes that can still be appended
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Append as much of `bytes` as fits, returning the number written
    #[inline]
    pub fn append(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.remaining());
        self.data.extend_from_slice(&bytes[..n]);
        n
    }

    /// The written bytes
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Discard written bytes, keeping the lease
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Return the buffer to its pool
    ///
    /// Equivalent to dropping it; spelled out where release is the intent.
    #[inline]
    pub fn recycle(self) {
        drop(self);
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.data.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        self.pool.recycle(data);
    }
}
