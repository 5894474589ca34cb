//! Record writer
//!
//! Routes each record through the channel selector into the per-channel
//! serializers, forwards full buffers to the result partition and refills
//! them from the buffer pool. Control events and end-of-superstep markers
//! flush a channel's buffered data first, so downstream consumers see them
//! after every record emitted before them.
//!
//! # Locking
//!
//! ```text
//! emit ──► selector lock (select, then release)
//!      └─► serializer lock of each target channel (serialize, forward, refill)
//! ```
//!
//! Each channel has its own lock. Operations on different channels do not
//! contend; operations on one channel are mutually exclusive. A request to
//! an exhausted pool blocks while holding the channel lock, which is how
//! backpressure reaches the producer.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use spindle_buffer::{Buffer, BufferPool};
use spindle_protocol::{ChannelId, Superstep, TaskEvent};
use spindle_recovery::{LogOutcome, RecoveryLog, RecoveryLogConfig, ReplayFilter};
use spindle_routing::{ChannelSelector, RoutingError, check_selection};
use tracing::{debug, info, trace, warn};

use crate::error::{Result, WriterError};
use crate::metrics::WriterMetrics;
use crate::partition::ResultPartitionWriter;
use crate::serializer::SpanningRecordSerializer;

const MAX_CHANNELS: usize = ChannelId::MAX as usize + 1;

/// Optional behaviour of a record writer
#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    /// Mirror records sent to remote channels into segments under this directory
    pub recovery_dir: Option<PathBuf>,
    /// Re-emit only the traffic of a lost node
    pub replay: Option<ReplayFilter>,
    /// Fail instead of blocking forever when the pool stays exhausted
    pub request_timeout: Option<Duration>,
}

/// Writes records of type `T` into a result partition `P`, routed by `S`
pub struct RecordWriter<T: ?Sized, P, S> {
    partition: P,
    pool: BufferPool,
    selector: Mutex<S>,
    serializers: Vec<Mutex<SpanningRecordSerializer>>,
    replay: Option<ReplayFilter>,
    recovery: Option<RecoveryLog>,
    request_timeout: Option<Duration>,
    closed: AtomicBool,
    metrics: WriterMetrics,
    _record: PhantomData<fn(&T)>,
}

impl<T, P, S> RecordWriter<T, P, S>
where
    T: Serialize + ?Sized,
    P: ResultPartitionWriter,
    S: ChannelSelector<T>,
{
    /// Create a writer with one serializer per output channel of `partition`
    pub fn new(partition: P, pool: BufferPool, selector: S) -> Result<Self> {
        Self::with_options(partition, pool, selector, WriterOptions::default())
    }

    pub fn with_options(
        partition: P,
        pool: BufferPool,
        selector: S,
        options: WriterOptions,
    ) -> Result<Self> {
        let num_channels = partition.number_of_output_channels();
        if num_channels > MAX_CHANNELS {
            return Err(RoutingError::too_many_channels(num_channels).into());
        }
        if let Some(filter) = &options.replay
            && filter.original_parallelism > MAX_CHANNELS
        {
            return Err(RoutingError::too_many_channels(filter.original_parallelism).into());
        }

        let recovery = options.recovery_dir.map(|dir| {
            let info = partition.partition_info();
            RecoveryLog::new(RecoveryLogConfig {
                dir,
                dataset: info.dataset.clone(),
                num_subpartitions: info.num_subpartitions,
                local_channel: info.local_channel,
            })
        });

        debug!(
            channels = num_channels,
            buffer_size = pool.buffer_size(),
            replay = ?options.replay,
            recovery = recovery.is_some(),
            "record writer created"
        );

        Ok(Self {
            partition,
            pool,
            selector: Mutex::new(selector),
            serializers: (0..num_channels)
                .map(|_| Mutex::new(SpanningRecordSerializer::new()))
                .collect(),
            replay: options.replay,
            recovery,
            request_timeout: options.request_timeout,
            closed: AtomicBool::new(false),
            metrics: WriterMetrics::new(),
            _record: PhantomData,
        })
    }

    /// Serialize `record` into every channel the selector picks
    ///
    /// `superstep` is the iteration round the record belongs to, `None`
    /// outside iterations. It drives the replay filter and the recovery log.
    /// May block while the buffer pool is exhausted.
    pub fn emit(&self, record: &T, superstep: Option<Superstep>) -> Result<()> {
        self.ensure_open()?;
        let num_channels = self.serializers.len();

        let replay = self.replay.as_ref().filter(|f| f.is_active(superstep));
        let targets = {
            let mut selector = self.selector.lock();
            let width = replay.map_or(num_channels, |f| f.original_parallelism);
            let selected = selector.select_channels(record, width);
            if let Some(filter) = replay
                && !filter.keeps(selected)
            {
                self.metrics.record_filtered();
                return Ok(());
            }
            // Same width: reuse the selection so stateful selectors advance once.
            if width == num_channels {
                selected.to_vec()
            } else {
                selector.select_channels(record, num_channels).to_vec()
            }
        };

        if targets.is_empty() {
            self.metrics.record_unrouted();
            return Ok(());
        }
        check_selection(&targets, num_channels)?;

        for channel in targets {
            self.emit_to(record, channel, superstep)?;
        }
        self.metrics.record_emitted();
        Ok(())
    }

    fn emit_to(&self, record: &T, channel: ChannelId, superstep: Option<Superstep>) -> Result<()> {
        let mut serializer = self.serializers[channel.as_usize()].lock();

        let mut result = serializer.add_record(record)?;
        self.log_for_recovery(channel, superstep, serializer.last_frame());

        while result.is_full_buffer() {
            if let Some(buffer) = serializer.take_current_buffer() {
                self.write_buffer(buffer, channel)?;
            }
            result = serializer.set_next_buffer(self.request_buffer()?);
        }
        Ok(())
    }

    /// Write `event` to every channel, after the data already buffered there
    pub fn broadcast_event(&self, event: &TaskEvent) -> Result<()> {
        self.ensure_open()?;

        for (index, slot) in self.serializers.iter().enumerate() {
            let channel = channel_at(index)?;
            let mut serializer = slot.lock();

            let forwarded = self.flush_channel(&mut serializer, channel)?;
            self.partition
                .write_event(event, channel)
                .map_err(|e| WriterError::transport(channel, e))?;
            self.metrics.record_event_written();

            if forwarded {
                serializer.set_next_buffer(self.request_buffer()?);
            }
        }

        trace!(event = event.name(), "event broadcast");
        Ok(())
    }

    /// Flush every channel, then signal the end of the superstep
    pub fn send_end_of_superstep(&self) -> Result<()> {
        self.ensure_open()?;

        for (index, slot) in self.serializers.iter().enumerate() {
            let channel = channel_at(index)?;
            let mut serializer = slot.lock();
            if self.flush_channel(&mut serializer, channel)? {
                serializer.set_next_buffer(self.request_buffer()?);
            }
        }

        if let Some(log) = &self.recovery {
            log.end_superstep();
        }

        self.partition
            .write_end_of_superstep()
            .map_err(WriterError::partition_transport)?;
        self.metrics.record_superstep_ended();
        trace!("end of superstep sent");
        Ok(())
    }

    /// Forward every channel's buffered data and close the recovery log
    ///
    /// Held buffers are given up: non-empty ones are forwarded, empty ones
    /// recycled. A second flush without emits in between writes nothing.
    /// A failing channel does not stop the others from being flushed; the
    /// first error is returned once every channel was tried.
    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for (index, slot) in self.serializers.iter().enumerate() {
            let flushed = channel_at(index).and_then(|channel| {
                let mut serializer = slot.lock();
                self.flush_channel(&mut serializer, channel)?;
                if let Some(empty) = serializer.take_current_buffer() {
                    empty.recycle();
                    self.metrics.record_buffers_discarded(1);
                }
                Ok(())
            });
            if let Err(e) = flushed {
                warn!(channel = index, error = %e, "channel flush failed");
                first_error.get_or_insert(e);
            }
        }

        if let Some(log) = &self.recovery {
            log.close();
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Flush and refuse further records
    ///
    /// Whatever a failed flush leaves behind is recycled. Closing twice is a
    /// no-op.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let flushed = self.flush();
        self.clear_buffers();

        let snapshot = self.metrics.snapshot();
        info!(
            records = snapshot.records_emitted,
            filtered = snapshot.records_filtered,
            buffers = snapshot.buffers_written,
            bytes = snapshot.bytes_written,
            supersteps = snapshot.supersteps_ended,
            recovery_failures = snapshot.recovery_failures,
            "record writer closed"
        );
        flushed
    }

    /// Forward the channel's buffer if it holds data
    ///
    /// Returns true if a buffer was forwarded.
    fn flush_channel(
        &self,
        serializer: &mut SpanningRecordSerializer,
        channel: ChannelId,
    ) -> Result<bool> {
        if serializer.has_data() {
            return Err(WriterError::illegal_state(format!(
                "serializer for {channel} holds {} bytes of an unfinished record but no buffer",
                serializer.pending()
            )));
        }
        if serializer.current_buffer().is_none_or(Buffer::is_empty) {
            return Ok(false);
        }
        match serializer.take_current_buffer() {
            Some(buffer) => {
                self.write_buffer(buffer, channel)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn write_buffer(&self, buffer: Buffer, channel: ChannelId) -> Result<()> {
        if buffer.is_empty() {
            buffer.recycle();
            self.metrics.record_buffers_discarded(1);
            return Ok(());
        }

        let len = buffer.len();
        self.partition
            .write_buffer(buffer, channel)
            .map_err(|e| WriterError::transport(channel, e))?;
        self.metrics.record_buffer_written(len);
        Ok(())
    }

    fn request_buffer(&self) -> Result<Buffer> {
        match self.request_timeout {
            None => Ok(self.pool.request_buffer_blocking()?),
            Some(timeout) => self
                .pool
                .request_buffer_timeout(timeout)?
                .ok_or(WriterError::BufferTimeout(timeout)),
        }
    }

    fn log_for_recovery(&self, channel: ChannelId, superstep: Option<Superstep>, frame: &[u8]) {
        let Some(log) = &self.recovery else {
            return;
        };
        match log.log_frame(channel, superstep, frame) {
            LogOutcome::Logged => self.metrics.record_recovery_logged(),
            LogOutcome::Failed => self.metrics.record_recovery_failure(),
            LogOutcome::Skipped => {}
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(WriterError::illegal_state("record writer is closed"));
        }
        Ok(())
    }

    pub fn partition(&self) -> &P {
        &self.partition
    }
}

impl<T: ?Sized, P, S> RecordWriter<T, P, S> {
    /// Recycle every buffer held by a serializer without forwarding it
    ///
    /// Used on abnormal teardown. Pending partial records are discarded.
    /// Returns the number of buffers recycled.
    pub fn clear_buffers(&self) -> usize {
        let recycled = self
            .serializers
            .iter()
            .filter(|slot| slot.lock().clear())
            .count();
        if recycled > 0 {
            self.metrics.record_buffers_discarded(recycled as u64);
            debug!(recycled, "cleared writer buffers");
        }
        recycled
    }

    pub fn num_channels(&self) -> usize {
        self.serializers.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> &WriterMetrics {
        &self.metrics
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn recovery_log(&self) -> Option<&RecoveryLog> {
        self.recovery.as_ref()
    }

    pub fn replay_filter(&self) -> Option<&ReplayFilter> {
        self.replay.as_ref()
    }
}

impl<T: ?Sized, P, S> Drop for RecordWriter<T, P, S> {
    fn drop(&mut self) {
        self.clear_buffers();
        if let Some(log) = &self.recovery {
            log.close();
        }
    }
}

impl<T: ?Sized, P, S> std::fmt::Debug for RecordWriter<T, P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordWriter")
            .field("channels", &self.serializers.len())
            .field("replay", &self.replay)
            .field("recovery", &self.recovery.is_some())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[inline]
fn channel_at(index: usize) -> Result<ChannelId> {
    ChannelId::from_usize(index).ok_or_else(|| RoutingError::too_many_channels(index + 1).into())
}
