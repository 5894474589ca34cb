//! Local superstep shuffle
//!
//! One producer drives a record writer over an in-process partition and one
//! consumer thread per channel reassembles the records it receives. Every
//! superstep each vertex messages its two neighbours through a
//! `MessagingContext`, then the writer closes the superstep.

use std::thread;

use anyhow::{Context, Result, bail};
use clap::Args;
use spindle_buffer::BufferPool;
use spindle_config::{Config, SelectorKind};
use spindle_protocol::{ChannelId, Superstep, TaskEvent};
use spindle_recovery::ReplayFilter;
use spindle_routing::{Broadcast, ChannelSelector, KeyPartitioned, RoundRobin};
use spindle_writer::{
    ChannelPartition, Delivery, Edge, Message, MessagingContext, MetricsSnapshot, PartitionInfo,
    RecordDeserializer, RecordWriter, WriterOptions,
};
use tracing::{debug, info, warn};

/// Vertex id to rank contribution
type Record = Message<u64, u64>;

type Selector = Box<dyn ChannelSelector<Record>>;

type Writer = RecordWriter<Record, ChannelPartition, Selector>;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Number of supersteps to run
    #[arg(short, long, default_value_t = 3)]
    pub supersteps: u32,

    /// Vertices per superstep; each sends two messages
    #[arg(short, long, default_value_t = 1000)]
    pub vertices: u64,

    /// Output channels; overrides [writer] channels
    #[arg(long)]
    pub channels: Option<usize>,

    /// Broadcast a checkpoint barrier after every N supersteps
    #[arg(long)]
    pub checkpoint_interval: Option<u32>,
}

/// What one consumer saw on its channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: ChannelId,
    pub records: u64,
    pub bytes: u64,
    pub events: u64,
    pub supersteps: u64,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub channels: Vec<ChannelReport>,
    pub metrics: MetricsSnapshot,
}

impl RunReport {
    pub fn records_received(&self) -> u64 {
        self.channels.iter().map(|c| c.records).sum()
    }
}

pub fn run(config: &Config, args: RunArgs) -> Result<()> {
    let report = shuffle(config, &args)?;

    println!("{:<12} {:>10} {:>12} {:>8} {:>10}", "CHANNEL", "RECORDS", "BYTES", "EVENTS", "SUPERSTEPS");
    for channel in &report.channels {
        println!(
            "{:<12} {:>10} {:>12} {:>8} {:>10}",
            channel.channel.to_string(),
            channel.records,
            channel.bytes,
            channel.events,
            channel.supersteps
        );
    }

    let m = &report.metrics;
    println!();
    println!("records emitted:   {}", m.records_emitted);
    println!("records filtered:  {}", m.records_filtered);
    println!("records received:  {}", report.records_received());
    println!(
        "buffers written:   {} (avg fill {:.0} bytes)",
        m.buffers_written,
        m.average_buffer_fill()
    );
    if m.recovery_records > 0 || m.recovery_failures > 0 {
        println!(
            "recovery log:      {} records, {} failures",
            m.recovery_records, m.recovery_failures
        );
    }
    Ok(())
}

/// Run the shuffle and collect what every channel received
pub fn shuffle(config: &Config, args: &RunArgs) -> Result<RunReport> {
    let channels = args.channels.unwrap_or(config.writer.channels);
    if channels == 0 {
        bail!("channels must be greater than 0");
    }

    let mut info = PartitionInfo::new(config.recovery.dataset.as_str(), channels);
    if let Some(local) = config.writer.local_channel {
        info = info.with_local_channel(ChannelId::new(local));
    }

    let options = writer_options(config)?;
    if let Some(replay) = &options.replay
        && config.writer.selector == SelectorKind::RoundRobin
        && replay.original_parallelism != channels
    {
        bail!(
            "round_robin replay needs the original {} channels, got {channels}",
            replay.original_parallelism
        );
    }
    if options.recovery_dir.is_some() && info.local_channel.is_none() {
        warn!("recovery log enabled without [writer] local_channel; nothing will be logged");
    }

    let pool = BufferPool::new(config.buffer.pool_size, config.buffer.buffer_size)
        .context("creating buffer pool")?;
    let (partition, receivers) = ChannelPartition::new(info);
    let writer = Writer::with_options(partition, pool, selector(config.writer.selector), options)
        .context("creating record writer")?;

    let consumers = receivers
        .into_iter()
        .enumerate()
        .map(|(index, receiver)| {
            let channel = ChannelId::from_usize(index)
                .with_context(|| format!("channel index {index} out of range"))?;
            thread::Builder::new()
                .name(format!("consumer-{index}"))
                .spawn(move || consume(channel, receiver))
                .context("spawning consumer thread")
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        channels,
        selector = config.writer.selector.as_str(),
        supersteps = args.supersteps,
        vertices = args.vertices,
        "starting shuffle"
    );

    let produced = produce(&writer, args);
    let metrics = writer.metrics().snapshot();
    // Dropping the writer disconnects the consumers.
    drop(writer);

    let mut reports = Vec::with_capacity(consumers.len());
    for handle in consumers {
        let report = handle
            .join()
            .map_err(|_| anyhow::anyhow!("consumer thread panicked"))??;
        reports.push(report);
    }
    produced?;

    Ok(RunReport {
        channels: reports,
        metrics,
    })
}

fn writer_options(config: &Config) -> Result<WriterOptions> {
    let recovery = &config.recovery;
    let replay = recovery
        .replay
        .map(|replay| {
            ReplayFilter::new(
                ChannelId::new(replay.lost_channel),
                Superstep::new(replay.end_superstep),
                replay.original_parallelism,
            )
        })
        .transpose()
        .context("building replay filter")?;
    Ok(WriterOptions {
        recovery_dir: recovery.enabled.then(|| recovery.path.clone()),
        replay,
        request_timeout: config.buffer.request_timeout,
    })
}

fn selector(kind: SelectorKind) -> Selector {
    match kind {
        SelectorKind::RoundRobin => Box::new(RoundRobin::new()),
        SelectorKind::Broadcast => Box::new(Broadcast::new()),
        SelectorKind::KeyPartitioned => Box::new(KeyPartitioned::new(|m: &Record| m.target)),
    }
}

fn neighbours(vertex: u64, vertices: u64) -> Vec<Edge<u64>> {
    if vertices <= 1 {
        return vec![Edge::to(vertex)];
    }
    vec![
        Edge::to((vertex + 1) % vertices),
        Edge::to(vertex.wrapping_mul(31).wrapping_add(7) % vertices),
    ]
}

fn produce(writer: &Writer, args: &RunArgs) -> Result<()> {
    for n in 0..args.supersteps {
        let step = Superstep::new(n);
        for vertex in 0..args.vertices {
            let mut ctx = MessagingContext::new(writer, Some(step), neighbours(vertex, args.vertices));
            ctx.send_message_to_all_neighbors(&(vertex ^ u64::from(n)))?;
        }

        if let Some(every) = args.checkpoint_interval
            && every > 0
            && (n + 1) % every == 0
        {
            writer.broadcast_event(&TaskEvent::barrier(u64::from(n), Some(step)))?;
        }

        writer.send_end_of_superstep()?;
        debug!(superstep = %step, "superstep finished");
    }

    writer.close()?;
    Ok(())
}

fn consume(channel: ChannelId, deliveries: impl IntoIterator<Item = Delivery>) -> Result<ChannelReport> {
    let mut deserializer = RecordDeserializer::new();
    let mut report = ChannelReport {
        channel,
        records: 0,
        bytes: 0,
        events: 0,
        supersteps: 0,
    };

    for delivery in deliveries {
        match delivery {
            Delivery::Buffer(buffer) => {
                report.bytes += buffer.len() as u64;
                deserializer.push(buffer.as_slice());
                while deserializer.next_record::<Record>()?.is_some() {
                    report.records += 1;
                }
            }
            Delivery::Event(event) => {
                debug!(channel = %channel, event = event.name(), "event received");
                report.events += 1;
            }
            Delivery::EndOfSuperstep => {
                if deserializer.has_partial_record() {
                    bail!("{channel}: superstep ended inside a record");
                }
                report.supersteps += 1;
            }
        }
    }

    if deserializer.has_partial_record() {
        bail!("{channel}: stream ended inside a record");
    }
    Ok(report)
}
