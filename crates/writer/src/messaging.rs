//! Vertex messaging on top of a record writer
//!
//! During one superstep a vertex may read its outgoing edges or message
//! every neighbour along them, but not both: both consume the same edge
//! list. The context hands that list out once and reports
//! `EdgesAlreadyUsed` afterwards.

use serde::{Deserialize, Serialize};
use spindle_protocol::Superstep;
use spindle_routing::ChannelSelector;

use crate::error::{Result, WriterError};
use crate::partition::ResultPartitionWriter;
use crate::record_writer::RecordWriter;

/// A message addressed to a vertex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message<K, M> {
    pub target: K,
    pub payload: M,
}

/// An outgoing edge of a vertex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<K, V = ()> {
    pub target: K,
    pub value: V,
}

impl<K> Edge<K> {
    pub fn to(target: K) -> Self {
        Self { target, value: () }
    }
}

/// Messaging context of one vertex for one superstep
pub struct MessagingContext<'w, K, M, V, P, S> {
    writer: &'w RecordWriter<Message<K, M>, P, S>,
    superstep: Option<Superstep>,
    edges: Option<Vec<Edge<K, V>>>,
}

impl<'w, K, M, V, P, S> MessagingContext<'w, K, M, V, P, S>
where
    K: Serialize + Clone,
    M: Serialize + Clone,
    P: ResultPartitionWriter,
    S: ChannelSelector<Message<K, M>>,
{
    pub fn new(
        writer: &'w RecordWriter<Message<K, M>, P, S>,
        superstep: Option<Superstep>,
        edges: Vec<Edge<K, V>>,
    ) -> Self {
        Self {
            writer,
            superstep,
            edges: Some(edges),
        }
    }

    /// Send `payload` to the vertex `target`
    pub fn send_message_to(&self, target: K, payload: M) -> Result<()> {
        self.writer
            .emit(&Message { target, payload }, self.superstep)
    }

    /// Take the outgoing edges; fails if they were already used
    pub fn outgoing_edges(&mut self) -> Result<std::vec::IntoIter<Edge<K, V>>> {
        self.edges
            .take()
            .map(Vec::into_iter)
            .ok_or(WriterError::EdgesAlreadyUsed)
    }

    /// Send `payload` along every outgoing edge; fails if the edges were already used
    ///
    /// Returns the number of messages sent.
    pub fn send_message_to_all_neighbors(&mut self, payload: &M) -> Result<usize> {
        let edges = self.edges.take().ok_or(WriterError::EdgesAlreadyUsed)?;
        for edge in &edges {
            self.send_message_to(edge.target.clone(), payload.clone())?;
        }
        Ok(edges.len())
    }

    /// Whether the edges have been handed out
    pub fn edges_used(&self) -> bool {
        self.edges.is_none()
    }

    pub fn superstep(&self) -> Option<Superstep> {
        self.superstep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserializer::RecordDeserializer;
    use crate::partition::{ChannelPartition, Delivery, PartitionInfo};
    use spindle_buffer::BufferPool;
    use spindle_routing::Forward;
    use spindle_protocol::ChannelId;

    type Msg = Message<u64, String>;

    fn writer() -> (
        RecordWriter<Msg, ChannelPartition, Forward>,
        Vec<crossbeam::channel::Receiver<Delivery>>,
    ) {
        let pool = BufferPool::new(4, 64).unwrap();
        let (partition, receivers) = ChannelPartition::new(PartitionInfo::new("msgs", 1));
        let writer = RecordWriter::new(partition, pool, Forward::new(ChannelId::new(0))).unwrap();
        (writer, receivers)
    }

    fn received(receivers: &[crossbeam::channel::Receiver<Delivery>]) -> Vec<Msg> {
        let mut deserializer = RecordDeserializer::new();
        while let Ok(delivery) = receivers[0].try_recv() {
            if let Delivery::Buffer(buffer) = delivery {
                deserializer.push(buffer.as_slice());
            }
        }
        deserializer.drain_records().unwrap()
    }

    #[test]
    fn test_send_to_all_neighbors_once() {
        let (writer, receivers) = writer();
        let mut ctx = MessagingContext::new(
            &writer,
            Some(Superstep::new(1)),
            vec![Edge::to(7), Edge::to(9)],
        );

        assert_eq!(ctx.send_message_to_all_neighbors(&"hi".to_string()).unwrap(), 2);
        assert!(ctx.edges_used());
        assert!(matches!(
            ctx.send_message_to_all_neighbors(&"again".to_string()),
            Err(WriterError::EdgesAlreadyUsed)
        ));
        assert!(matches!(ctx.outgoing_edges(), Err(WriterError::EdgesAlreadyUsed)));

        writer.flush().unwrap();
        let targets: Vec<_> = received(&receivers).into_iter().map(|m| m.target).collect();
        assert_eq!(targets, vec![7, 9]);
    }

    #[test]
    fn test_outgoing_edges_then_broadcast_fails() {
        let (writer, _receivers) = writer();
        let mut ctx: MessagingContext<'_, u64, String, (), _, _> =
            MessagingContext::new(&writer, None, vec![Edge::to(1), Edge::to(2), Edge::to(3)]);

        let edges: Vec<_> = ctx.outgoing_edges().unwrap().collect();
        assert_eq!(edges.len(), 3);
        assert!(matches!(
            ctx.send_message_to_all_neighbors(&"x".to_string()),
            Err(WriterError::EdgesAlreadyUsed)
        ));
    }

    #[test]
    fn test_direct_messages_do_not_consume_edges() {
        let (writer, receivers) = writer();
        let mut ctx = MessagingContext::new(&writer, None, vec![Edge::to(5)]);

        ctx.send_message_to(42, "direct".to_string()).unwrap();
        ctx.send_message_to(43, "direct".to_string()).unwrap();
        assert!(!ctx.edges_used());
        assert_eq!(ctx.send_message_to_all_neighbors(&"all".to_string()).unwrap(), 1);

        writer.flush().unwrap();
        let messages = received(&receivers);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], Message { target: 42, payload: "direct".to_string() });
        assert_eq!(messages[2].target, 5);
    }
}
