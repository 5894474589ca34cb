//! Benchmarks for the record writer emit path
//!
//! Buffers are dropped by the partition as soon as they arrive, so the
//! numbers cover serialization, routing and pool turnover only.

use std::io;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use spindle_buffer::{Buffer, BufferPool};
use spindle_protocol::{ChannelId, Superstep, TaskEvent};
use spindle_routing::{KeyPartitioned, RoundRobin};
use spindle_writer::{PartitionInfo, RecordWriter, ResultPartitionWriter};

struct DiscardPartition {
    info: PartitionInfo,
}

impl DiscardPartition {
    fn new(channels: usize) -> Self {
        Self {
            info: PartitionInfo::new("bench", channels),
        }
    }
}

impl ResultPartitionWriter for DiscardPartition {
    fn write_buffer(&self, buffer: Buffer, _channel: ChannelId) -> io::Result<()> {
        black_box(buffer.len());
        Ok(())
    }

    fn write_event(&self, _event: &TaskEvent, _channel: ChannelId) -> io::Result<()> {
        Ok(())
    }

    fn write_end_of_superstep(&self) -> io::Result<()> {
        Ok(())
    }

    fn number_of_output_channels(&self) -> usize {
        self.info.num_subpartitions
    }

    fn partition_info(&self) -> &PartitionInfo {
        &self.info
    }
}

fn bench_small_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_small");
    let records: Vec<(u64, u64)> = (0..1000).map(|i| (i, i * 31)).collect();

    for channels in [1, 8, 64] {
        let pool = BufferPool::new(channels * 2, 32 * 1024).unwrap();
        let writer: RecordWriter<(u64, u64), _, _> =
            RecordWriter::new(DiscardPartition::new(channels), pool, RoundRobin::new()).unwrap();

        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_function(format!("round_robin_{channels}_channels"), |b| {
            b.iter(|| {
                for record in &records {
                    writer.emit(black_box(record), None).unwrap();
                }
            })
        });
    }

    group.finish();
}

fn bench_keyed_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_keyed");
    let records: Vec<(u64, u64)> = (0..1000).map(|i| (i * 7919, i)).collect();
    let pool = BufferPool::new(32, 32 * 1024).unwrap();
    let writer = RecordWriter::new(
        DiscardPartition::new(16),
        pool,
        KeyPartitioned::new(|r: &(u64, u64)| r.0),
    )
    .unwrap();

    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("key_partitioned_16_channels", |b| {
        b.iter(|| {
            for record in &records {
                writer.emit(black_box(record), Some(Superstep::FIRST)).unwrap();
            }
        })
    });

    group.finish();
}

fn bench_spanning_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_spanning");

    for size in [4 * 1024, 64 * 1024, 512 * 1024] {
        let payload = vec![0x5Au8; size];
        let pool = BufferPool::new(4, 32 * 1024).unwrap();
        let writer: RecordWriter<Vec<u8>, _, _> =
            RecordWriter::new(DiscardPartition::new(1), pool, RoundRobin::new()).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("{}_bytes", size), |b| {
            b.iter(|| writer.emit(black_box(&payload), None).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_small_records,
    bench_keyed_records,
    bench_spanning_records
);
criterion_main!(benches);
