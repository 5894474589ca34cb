//! Spindle - Record Writer
//!
//! Serializes typed records into fixed-size buffers, routes them across the
//! output channels of a result partition and interleaves control events
//! with the data, per channel and in order.
//!
//! # Architecture
//!
//! ```text
//!                       ┌──────────────────┐
//!  emit(record, step) ─►│ ChannelSelector  │── [ch 1, ...]
//!                       └──────────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        ▼                       ▼                       ▼
//!  ┌────────────┐          ┌────────────┐          ┌────────────┐
//!  │ serializer │ ch 0     │ serializer │ ch 1     │ serializer │ ch N-1
//!  └────────────┘          └────────────┘          └────────────┘
//!        │ full buffer           │                       │
//!        ▼                       ▼                       ▼
//!  ┌─────────────────────────────────────────────────────────────┐
//!  │                  ResultPartitionWriter                      │
//!  └─────────────────────────────────────────────────────────────┘
//!        ▲ fresh buffers
//!  ┌────────────┐
//!  │ BufferPool │  (blocks when exhausted)
//!  └────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use spindle_buffer::BufferPool;
//! use spindle_routing::RoundRobin;
//! use spindle_writer::{ChannelPartition, Delivery, PartitionInfo, RecordDeserializer, RecordWriter};
//!
//! let pool = BufferPool::new(8, 64).unwrap();
//! let (partition, receivers) = ChannelPartition::new(PartitionInfo::new("words", 2));
//! let writer: RecordWriter<str, _, _> =
//!     RecordWriter::new(partition, pool, RoundRobin::new()).unwrap();
//!
//! for word in ["a", "b", "c"] {
//!     writer.emit(word, None).unwrap();
//! }
//! writer.flush().unwrap();
//!
//! let mut deserializer = RecordDeserializer::new();
//! while let Ok(Delivery::Buffer(buffer)) = receivers[0].try_recv() {
//!     deserializer.push(buffer.as_slice());
//! }
//! let words: Vec<String> = deserializer.drain_records().unwrap();
//! assert_eq!(words, ["a", "c"]);
//! ```

mod deserializer;
mod error;
mod messaging;
mod metrics;
mod partition;
mod record_writer;
mod serializer;

pub use deserializer::RecordDeserializer;
pub use error::{Result, TransportTarget, WriterError};
pub use messaging::{Edge, Message, MessagingContext};
pub use metrics::{MetricsSnapshot, WriterMetrics};
pub use partition::{ChannelPartition, Delivery, PartitionInfo, ResultPartitionWriter};
pub use record_writer::{RecordWriter, WriterOptions};
pub use serializer::{SerializationResult, SpanningRecordSerializer};
