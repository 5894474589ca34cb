//! Result partition contract and an in-process implementation
//!
//! The record writer hands finished buffers, events and end-of-superstep
//! markers to a `ResultPartitionWriter`. Ownership of a buffer passes to the
//! partition with the call; the consumer recycles it by dropping it.

use std::io;

use crossbeam::channel::{self, Receiver, Sender};
use spindle_buffer::Buffer;
use spindle_protocol::{ChannelId, DatasetId, TaskEvent};

/// Static facts about the partition a writer produces into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionInfo {
    /// Dataset the partition belongs to
    pub dataset: DatasetId,
    /// Number of subpartitions, one per output channel
    pub num_subpartitions: usize,
    /// Subpartition consumed on the producer's own node
    pub local_channel: Option<ChannelId>,
}

impl PartitionInfo {
    pub fn new(dataset: impl Into<DatasetId>, num_subpartitions: usize) -> Self {
        Self {
            dataset: dataset.into(),
            num_subpartitions,
            local_channel: None,
        }
    }

    #[must_use]
    pub fn with_local_channel(mut self, channel: ChannelId) -> Self {
        self.local_channel = Some(channel);
        self
    }
}

/// Transport-facing sink for the output of a record writer
pub trait ResultPartitionWriter: Send + Sync {
    /// Forward a filled buffer to `channel`
    fn write_buffer(&self, buffer: Buffer, channel: ChannelId) -> io::Result<()>;

    /// Forward a control event to `channel`
    fn write_event(&self, event: &TaskEvent, channel: ChannelId) -> io::Result<()>;

    /// Signal the end of the current superstep on every subpartition
    fn write_end_of_superstep(&self) -> io::Result<()>;

    fn number_of_output_channels(&self) -> usize;

    fn partition_info(&self) -> &PartitionInfo;
}

/// What a subpartition consumer receives, in send order
#[derive(Debug)]
pub enum Delivery {
    Buffer(Buffer),
    Event(TaskEvent),
    EndOfSuperstep,
}

/// In-process partition backed by one unbounded crossbeam channel per subpartition
///
/// # Example
///
/// ```
/// use spindle_protocol::{ChannelId, TaskEvent};
/// use spindle_writer::{ChannelPartition, Delivery, PartitionInfo, ResultPartitionWriter};
///
/// let (partition, receivers) = ChannelPartition::new(PartitionInfo::new("ranks", 2));
/// partition.write_event(&TaskEvent::EndOfSuperstep, ChannelId::new(1)).unwrap();
/// assert!(matches!(receivers[1].try_recv(), Ok(Delivery::Event(_))));
/// ```
#[derive(Debug)]
pub struct ChannelPartition {
    info: PartitionInfo,
    senders: Vec<Sender<Delivery>>,
}

impl ChannelPartition {
    /// Create the partition and the receivers of its subpartitions
    pub fn new(info: PartitionInfo) -> (Self, Vec<Receiver<Delivery>>) {
        let (senders, receivers) = (0..info.num_subpartitions)
            .map(|_| channel::unbounded())
            .unzip();
        (Self { info, senders }, receivers)
    }

    fn send(&self, channel: ChannelId, delivery: Delivery) -> io::Result<()> {
        let sender = self.senders.get(channel.as_usize()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{channel} is not a subpartition of {}", self.info.dataset),
            )
        })?;
        sender.send(delivery).map_err(|_| {
            io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("consumer of {channel} disconnected"),
            )
        })
    }
}

impl ResultPartitionWriter for ChannelPartition {
    fn write_buffer(&self, buffer: Buffer, channel: ChannelId) -> io::Result<()> {
        self.send(channel, Delivery::Buffer(buffer))
    }

    fn write_event(&self, event: &TaskEvent, channel: ChannelId) -> io::Result<()> {
        self.send(channel, Delivery::Event(event.clone()))
    }

    fn write_end_of_superstep(&self) -> io::Result<()> {
        for index in 0..self.senders.len() {
            let channel = ChannelId::from_usize(index).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "subpartition index overflow")
            })?;
            self.send(channel, Delivery::EndOfSuperstep)?;
        }
        Ok(())
    }

    fn number_of_output_channels(&self) -> usize {
        self.senders.len()
    }

    fn partition_info(&self) -> &PartitionInfo {
        &self.info
    }
}
