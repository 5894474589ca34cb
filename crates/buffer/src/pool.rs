//! Bounded buffer pool with blocking acquisition
//!
//! Buffers are pre-allocated at construction and circulate through a
//! lock-free queue. The mutex/condvar pair is only touched when a requester
//! has to wait or a recycled buffer may have a waiter to wake.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use crossbeam::queue::ArrayQueue;
use parking_lot::{Condvar, Mutex};

use crate::{Buffer, BufferError, Result};

/// Shared pool state, referenced by the pool handle and every leased buffer
pub(crate) struct PoolInner {
    /// Lock-free queue of available segments
    free: ArrayQueue<BytesMut>,

    /// Capacity of each buffer
    buffer_size: usize,

    /// Set once by `destroy()`
    destroyed: AtomicBool,

    /// Guards condvar waits
    lock: Mutex<()>,

    /// Signalled whenever a segment is recycled or the pool is destroyed
    available: Condvar,

    metrics: BufferPoolMetrics,
}

impl PoolInner {
    /// Take a segment back from a dropped buffer
    pub(crate) fn recycle(&self, mut data: BytesMut) {
        self.metrics.recycled.fetch_add(1, Ordering::Relaxed);

        if self.destroyed.load(Ordering::Acquire) {
            return;
        }

        data.clear();
        // Cannot overflow: every segment in circulation came from this queue
        let _ = self.free.push(data);

        let _guard = self.lock.lock();
        self.available.notify_one();
    }
}

/// Counters for pool monitoring
#[derive(Debug, Default)]
pub struct BufferPoolMetrics {
    /// Buffers handed out
    pub requested: AtomicU64,

    /// Buffers returned
    pub recycled: AtomicU64,

    /// Requests that had to wait for a buffer
    pub waits: AtomicU64,
}

impl BufferPoolMetrics {
    /// Get snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requested: self.requested.load(Ordering::Relaxed),
            recycled: self.recycled.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pool metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requested: u64,
    pub recycled: u64,
    pub waits: u64,
}

impl MetricsSnapshot {
    /// Buffers currently leased out
    pub fn outstanding(&self) -> u64 {
        self.requested.saturating_sub(self.recycled)
    }
}

/// Bounded pool of fixed-size buffers
///
/// Cloning the pool clones the handle; all clones share the same buffers.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    /// Create a pool of `num_buffers` buffers of `buffer_size` bytes each
    ///
    /// # Errors
    ///
    /// Returns `InvalidPool` if either dimension is zero.
    pub fn new(num_buffers: usize, buffer_size: usize) -> Result<Self> {
        if num_buffers == 0 || buffer_size == 0 {
            return Err(BufferError::InvalidPool {
                num_buffers,
                buffer_size,
            });
        }

        let free = ArrayQueue::new(num_buffers);
        for _ in 0..num_buffers {
            // Filling an empty queue of exactly this capacity
            let _ = free.push(BytesMut::with_capacity(buffer_size));
        }

        tracing::debug!(num_buffers, buffer_size, "buffer pool created");

        Ok(Self {
            inner: Arc::new(PoolInner {
                free,
                buffer_size,
                destroyed: AtomicBool::new(false),
                lock: Mutex::new(()),
                available: Condvar::new(),
                metrics: BufferPoolMetrics::default(),
            }),
        })
    }

    #[inline]
    fn lease(&self, data: BytesMut) -> Buffer {
        self.inner.metrics.requested.fetch_add(1, Ordering::Relaxed);
        Buffer::new(data, self.inner.buffer_size, Arc::clone(&self.inner))
    }

    #[inline]
    fn check_alive(&self) -> Result<()> {
        if self.inner.destroyed.load(Ordering::Acquire) {
            Err(BufferError::PoolDestroyed)
        } else {
            Ok(())
        }
    }

    /// Take a buffer if one is free, without waiting
    pub fn try_request_buffer(&self) -> Result<Option<Buffer>> {
        self.check_alive()?;
        Ok(self.inner.free.pop().map(|data| self.lease(data)))
    }

    /// Take a buffer, parking the calling thread until one is free
    ///
    /// # Errors
    ///
    /// Returns `PoolDestroyed` if the pool is destroyed before a buffer
    /// becomes available.
    pub fn request_buffer_blocking(&self) -> Result<Buffer> {
        if let Some(buffer) = self.try_request_buffer()? {
            return Ok(buffer);
        }

        self.inner.metrics.waits.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.inner.lock.lock();
        loop {
            self.check_alive()?;
            if let Some(data) = self.inner.free.pop() {
                return Ok(self.lease(data));
            }
            self.inner.available.wait(&mut guard);
        }
    }

    /// Like `request_buffer_blocking`, giving up after `timeout`
    ///
    /// Returns `Ok(None)` when the timeout elapses.
    pub fn request_buffer_timeout(&self, timeout: Duration) -> Result<Option<Buffer>> {
        if let Some(buffer) = self.try_request_buffer()? {
            return Ok(Some(buffer));
        }

        self.inner.metrics.waits.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.lock.lock();
        loop {
            self.check_alive()?;
            if let Some(data) = self.inner.free.pop() {
                return Ok(Some(self.lease(data)));
            }
            if self.inner.available.wait_until(&mut guard, deadline).timed_out() {
                return Ok(self.inner.free.pop().map(|data| self.lease(data)));
            }
        }
    }

    /// Tear the pool down, waking every blocked requester with an error
    ///
    /// Buffers still leased stay valid; their memory is released instead of
    /// recycled when they are dropped.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        while self.inner.free.pop().is_some() {}

        let _guard = self.inner.lock.lock();
        self.inner.available.notify_all();
        tracing::debug!("buffer pool destroyed");
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Number of buffers currently free
    #[inline]
    pub fn available(&self) -> usize {
        self.inner.free.len()
    }

    /// Total number of buffers in the pool
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.free.capacity()
    }

    /// Size of each buffer in bytes
    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.inner.buffer_size
    }

    /// Buffers currently leased out and not yet returned
    #[inline]
    pub fn outstanding(&self) -> u64 {
        self.inner.metrics.snapshot().outstanding()
    }

    #[inline]
    pub fn metrics(&self) -> &BufferPoolMetrics {
        &self.inner.metrics
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("capacity", &self.capacity())
            .field("available", &self.available())
            .field("buffer_size", &self.inner.buffer_size)
            .finish()
    }
}
