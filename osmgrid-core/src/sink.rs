//! Persistence boundary for finished graphs.

use crate::aggregate::PartitionedGraph;

/// Destination for a fully resolved [`PartitionedGraph`].
///
/// A sink is handed the graph once, after aggregation, and owns the choice of
/// serialisation. Implementations should make the write appear atomic to
/// readers where the backing store allows it.
pub trait GraphSink {
    /// Error produced when persisting fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist every partition and the global partition map.
    fn persist(&mut self, graph: &PartitionedGraph) -> Result<(), Self::Error>;
}

impl<S: GraphSink + ?Sized> GraphSink for &mut S {
    type Error = S::Error;

    fn persist(&mut self, graph: &PartitionedGraph) -> Result<(), Self::Error> {
        (**self).persist(graph)
    }
}
