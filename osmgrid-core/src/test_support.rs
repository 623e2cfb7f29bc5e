//! In-memory helpers for tests.

use std::convert::Infallible;

use crate::{aggregate::PartitionedGraph, sink::GraphSink};

/// Sink that keeps every persisted graph in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    persisted: Vec<PartitionedGraph>,
}

impl MemorySink {
    /// Graphs handed to the sink, in order.
    #[must_use]
    pub fn persisted(&self) -> &[PartitionedGraph] {
        &self.persisted
    }

    /// The most recently persisted graph.
    #[must_use]
    pub fn last(&self) -> Option<&PartitionedGraph> {
        self.persisted.last()
    }
}

impl GraphSink for MemorySink {
    type Error = Infallible;

    fn persist(&mut self, graph: &PartitionedGraph) -> Result<(), Self::Error> {
        self.persisted.push(graph.clone());
        Ok(())
    }
}
