//! Per-channel recovery log with superstep rotation
//!
//! Every record sent to a remote channel during an iteration is mirrored
//! into the segment for `(channel, superstep)`. The writer finishes every
//! open segment at the superstep barrier, and the first record of a new
//! superstep on a channel closes whatever segment is still open before
//! opening the next one. Nothing here ever fails the caller: open and write errors are
//! warned about through a `RateLimitedLogger` and counted.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use spindle_protocol::{ChannelId, DatasetId, Superstep};
use tracing::{debug, info};

use crate::rate_limited_logger::RateLimitedLogger;
use crate::segment::segment_path;
use crate::writer::SegmentWriter;

/// Where and for whom the recovery log is written
#[derive(Debug, Clone)]
pub struct RecoveryLogConfig {
    /// Directory holding the segments
    pub dir: PathBuf,
    pub dataset: DatasetId,
    /// Number of subpartitions of the producing partition
    pub num_subpartitions: usize,
    /// Channel consumed on the producer's own node, never logged
    pub local_channel: Option<ChannelId>,
}

/// What happened to one logged frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    /// Logging does not apply to this channel or superstep
    Skipped,
    /// Frame appended to the channel's segment
    Logged,
    /// Segment could not be opened or written; the frame is lost to the log
    Failed,
}

#[derive(Debug, Default)]
struct ChannelLog {
    segment: Option<SegmentWriter>,
    /// Superstep of the most recent segment, open or closed
    last_superstep: Option<Superstep>,
    /// Superstep whose segment failed; not retried until the superstep moves on
    failed_superstep: Option<Superstep>,
}

/// Best-effort recovery log for one producing partition
pub struct RecoveryLog {
    config: RecoveryLogConfig,
    channels: Vec<Mutex<ChannelLog>>,
    failures: RateLimitedLogger,
    records: AtomicU64,
    segments_opened: AtomicU64,
}

impl RecoveryLog {
    pub fn new(config: RecoveryLogConfig) -> Self {
        let channels = (0..config.num_subpartitions)
            .map(|_| Mutex::new(ChannelLog::default()))
            .collect();
        info!(
            dir = %config.dir.display(),
            dataset = %config.dataset,
            subpartitions = config.num_subpartitions,
            local_channel = ?config.local_channel,
            "recovery log configured"
        );
        Self {
            config,
            channels,
            failures: RateLimitedLogger::default(),
            records: AtomicU64::new(0),
            segments_opened: AtomicU64::new(0),
        }
    }

    /// Whether a record sent to `channel` in `superstep` is logged
    ///
    /// Logging applies only inside an iteration, only when the partition has
    /// more than one subpartition, and never to the local channel. Without a
    /// known local channel nothing is logged.
    pub fn is_engaged(&self, channel: ChannelId, superstep: Option<Superstep>) -> bool {
        self.config.num_subpartitions > 1
            && superstep.is_some()
            && channel.is_within(self.channels.len())
            && self.config.local_channel.is_some_and(|local| local != channel)
    }

    /// Mirror one framed record sent to `channel`
    pub fn log_frame(
        &self,
        channel: ChannelId,
        superstep: Option<Superstep>,
        frame: &[u8],
    ) -> LogOutcome {
        if !self.is_engaged(channel, superstep) {
            return LogOutcome::Skipped;
        }
        let Some(step) = superstep else {
            return LogOutcome::Skipped;
        };

        let mut guard = self.channels[channel.as_usize()].lock();
        let log = &mut *guard;

        if log.segment.as_ref().map(SegmentWriter::superstep) != Some(step) {
            if let Some(old) = log.segment.take() {
                self.finish_segment(channel, old);
            }
            if log.failed_superstep == Some(step) {
                return LogOutcome::Failed;
            }

            let path = segment_path(&self.config.dir, &self.config.dataset, channel, step);
            let opened = if log.last_superstep == Some(step) {
                SegmentWriter::append(path, step)
            } else {
                SegmentWriter::create(path, step)
            };
            match opened {
                Ok(segment) => {
                    debug!(%channel, superstep = %step, path = %segment.path().display(), "opened recovery segment");
                    self.segments_opened.fetch_add(1, Ordering::Relaxed);
                    log.segment = Some(segment);
                    log.last_superstep = Some(step);
                    log.failed_superstep = None;
                }
                Err(e) => {
                    log.failed_superstep = Some(step);
                    self.failures.warn("open recovery segment", &e);
                    return LogOutcome::Failed;
                }
            }
        }

        let Some(segment) = log.segment.as_mut() else {
            return LogOutcome::Failed;
        };
        match segment.write_frame(frame) {
            Ok(()) => {
                self.records.fetch_add(1, Ordering::Relaxed);
                LogOutcome::Logged
            }
            Err(e) => {
                self.failures.warn("write recovery segment", &e);
                log.segment = None;
                log.failed_superstep = Some(step);
                LogOutcome::Failed
            }
        }
    }

    /// Finish every open segment at the end of a superstep
    ///
    /// Channels that received nothing in the superstep still get their
    /// previous segment flushed to disk here. Returns the number of
    /// segments finished.
    pub fn end_superstep(&self) -> usize {
        let finished = self.finish_all();
        if finished > 0 {
            debug!(segments = finished, "recovery segments finished at superstep barrier");
        }
        finished
    }

    /// Flush and close every open segment
    ///
    /// Logging may resume afterwards; a channel that logs again in the same
    /// superstep appends to its segment instead of truncating it.
    pub fn close(&self) {
        self.finish_all();
    }

    fn finish_all(&self) -> usize {
        let mut finished = 0;
        for (index, slot) in self.channels.iter().enumerate() {
            let segment = slot.lock().segment.take();
            if let (Some(segment), Some(channel)) = (segment, ChannelId::from_usize(index)) {
                self.finish_segment(channel, segment);
                finished += 1;
            }
        }
        finished
    }

    fn finish_segment(&self, channel: ChannelId, segment: SegmentWriter) {
        let path = segment.path().to_path_buf();
        let superstep = segment.superstep();
        match segment.finish() {
            Ok(records) => {
                debug!(%channel, %superstep, records, path = %path.display(), "closed recovery segment");
            }
            Err(e) => {
                self.failures.warn("close recovery segment", &e);
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    pub fn dataset(&self) -> &DatasetId {
        &self.config.dataset
    }

    /// Frames successfully written
    pub fn records_logged(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    /// Open, write and close failures
    pub fn failures(&self) -> u64 {
        self.failures.total_count()
    }

    pub fn segments_opened(&self) -> u64 {
        self.segments_opened.load(Ordering::Relaxed)
    }

    /// Number of channels with an open segment
    pub fn open_segments(&self) -> usize {
        self.channels
            .iter()
            .filter(|slot| slot.lock().segment.is_some())
            .count()
    }
}

impl std::fmt::Debug for RecoveryLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryLog")
            .field("config", &self.config)
            .field("records", &self.records_logged())
            .field("failures", &self.failures())
            .finish()
    }
}
