//! Final grouping of accepted points into partitions.

use std::collections::{BTreeMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    graph::AdjacencyGraph,
    partition::{PartitionAssigner, PartitionKey},
    point::{NodeId, Point},
};

/// One accepted point with its resolved neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionedNode {
    /// Node identifier.
    pub id: NodeId,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Adjacent accepted nodes in ascending identifier order.
    pub adjacency: Vec<NodeId>,
}

/// Fully resolved output of a pipeline run.
///
/// Built once after the whole input has been consumed, so every neighbour
/// list is final by the time a sink sees it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedGraph {
    partition_of: BTreeMap<NodeId, PartitionKey>,
    partitions: BTreeMap<PartitionKey, Vec<PartitionedNode>>,
}

impl PartitionedGraph {
    /// Global identifier to partition map.
    #[must_use]
    pub const fn partition_map(&self) -> &BTreeMap<NodeId, PartitionKey> {
        &self.partition_of
    }

    /// Partition of a node, if it was accepted.
    #[must_use]
    pub fn partition_of(&self, id: &str) -> Option<&PartitionKey> {
        self.partition_of.get(id)
    }

    /// Nodes grouped by partition, both levels in ascending order.
    #[must_use]
    pub const fn partitions(&self) -> &BTreeMap<PartitionKey, Vec<PartitionedNode>> {
        &self.partitions
    }

    /// Nodes in one partition.
    #[must_use]
    pub fn partition(&self, key: &PartitionKey) -> Option<&[PartitionedNode]> {
        self.partitions.get(key).map(Vec::as_slice)
    }

    /// Number of accepted nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.partition_of.len()
    }

    /// Number of non-empty partitions.
    #[must_use]
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Number of undirected edges between accepted nodes.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes().map(|node| node.adjacency.len()).sum::<usize>() / 2
    }

    /// Every node across all partitions.
    pub fn nodes(&self) -> impl Iterator<Item = &PartitionedNode> {
        self.partitions.values().flatten()
    }

    /// Whether no point was accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partition_of.is_empty()
    }
}

/// Assign partitions to `points` and attach their neighbours from `graph`.
///
/// Neighbours are restricted to identifiers present in `points`, which
/// discards edges admitted by approximate membership false positives. When an
/// identifier occurs more than once the first point wins.
///
/// # Examples
/// ```
/// use osmgrid_core::{AdjacencyGraph, PartitionAssigner, Point, aggregate};
///
/// let mut graph = AdjacencyGraph::default();
/// graph.add_edge("a", "b");
/// graph.add_edge("b", "ghost");
///
/// let points = [Point::new("a", 1.0, 1.0), Point::new("b", 1.0, 1.0001)];
/// let result = aggregate(&points, &graph, &PartitionAssigner::default());
///
/// assert_eq!(result.partition_count(), 1);
/// assert_eq!(result.edge_count(), 1);
/// ```
#[must_use]
pub fn aggregate(
    points: &[Point],
    graph: &AdjacencyGraph,
    assigner: &PartitionAssigner,
) -> PartitionedGraph {
    let accepted: HashSet<&str> = points.iter().map(|point| point.id.as_str()).collect();
    let mut result = PartitionedGraph::default();

    for point in points {
        if result.partition_of.contains_key(&point.id) {
            debug!("duplicate point {} ignored during aggregation", point.id);
            continue;
        }
        let key = assigner.assign(point);
        let adjacency = graph
            .neighbours(&point.id)
            .into_iter()
            .flatten()
            .filter(|neighbour| accepted.contains(neighbour.as_str()))
            .cloned()
            .collect();
        result.partition_of.insert(point.id.clone(), key.clone());
        result
            .partitions
            .entry(key)
            .or_default()
            .push(PartitionedNode {
                id: point.id.clone(),
                lat: point.lat(),
                lon: point.lon(),
                adjacency,
            });
    }

    for nodes in result.partitions.values_mut() {
        nodes.sort_by(|left, right| left.id.cmp(&right.id));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::PartitionPrecision;
    use rstest::{fixture, rstest};

    #[fixture]
    fn graph() -> AdjacencyGraph {
        let mut graph = AdjacencyGraph::default();
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");
        graph.add_edge("c", "false-positive");
        graph
    }

    #[fixture]
    fn points() -> Vec<Point> {
        vec![
            Point::new("c", 2.5, 2.5),
            Point::new("a", 1.0, 1.0),
            Point::new("b", 1.0, 1.0001),
        ]
    }

    #[rstest]
    fn groups_points_by_partition(points: Vec<Point>, graph: AdjacencyGraph) {
        let result = aggregate(&points, &graph, &PartitionAssigner::default());

        let cell = PartitionKey::new("1.000", "1.000");
        let ids: Vec<_> = result
            .partition(&cell)
            .expect("shared cell")
            .iter()
            .map(|node| node.id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(result.partition_count(), 2);
        assert_eq!(result.partition_of("c"), Some(&PartitionKey::new("2.500", "2.500")));
    }

    #[rstest]
    fn restricts_neighbours_to_accepted_points(points: Vec<Point>, graph: AdjacencyGraph) {
        let result = aggregate(&points, &graph, &PartitionAssigner::default());
        let c = result
            .nodes()
            .find(|node| node.id == "c")
            .expect("c is accepted");
        assert_eq!(c.adjacency, ["b"]);
        assert_eq!(result.edge_count(), 2);
    }

    #[rstest]
    fn isolated_points_keep_empty_adjacency(graph: AdjacencyGraph) {
        let points = [Point::new("lonely", 0.5, 0.5)];
        let result = aggregate(&points, &graph, &PartitionAssigner::default());
        assert_eq!(result.node_count(), 1);
        assert!(result.nodes().all(|node| node.adjacency.is_empty()));
    }

    #[rstest]
    fn first_duplicate_wins(graph: AdjacencyGraph) {
        let points = [Point::new("a", 1.0, 1.0), Point::new("a", 5.0, 5.0)];
        let precision = PartitionPrecision::new(0).expect("valid precision");
        let result = aggregate(&points, &graph, &PartitionAssigner::new(precision));
        assert_eq!(result.partition_of("a"), Some(&PartitionKey::new("1", "1")));
        assert_eq!(result.node_count(), 1);
    }

    #[rstest]
    fn empty_input_yields_empty_graph(graph: AdjacencyGraph) {
        assert!(aggregate(&[], &graph, &PartitionAssigner::default()).is_empty());
    }
}
