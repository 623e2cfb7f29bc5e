//! Undirected adjacency graph built from accepted ways.

use std::collections::{BTreeSet, HashMap};

use crate::{membership::MembershipIndex, point::NodeId, way::Way};

/// Outcome of adding one way to the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WayEdges {
    /// Consecutive pairs whose endpoints were both accepted.
    pub linked_pairs: usize,
    /// Edges that were not present before this way.
    pub new_edges: usize,
    /// Pairs dropped because at least one endpoint was not accepted.
    pub dangling_pairs: usize,
}

/// Symmetric neighbour sets keyed by node identifier.
///
/// Every insertion goes in both directions, so `b` is a neighbour of `a`
/// exactly when `a` is a neighbour of `b`. Neighbour sets are ordered to keep
/// downstream output deterministic. Self-loops are ignored.
///
/// # Examples
/// ```
/// use osmgrid_core::{AdjacencyGraph, ExactIndex, MembershipIndex, Tags, Way};
///
/// let mut accepted = ExactIndex::default();
/// accepted.record("a");
/// accepted.record("b");
///
/// let mut graph = AdjacencyGraph::default();
/// let edges = graph.add_way(&Way::new(["a", "b", "c"], Tags::new()), &accepted);
///
/// assert_eq!(edges.new_edges, 1);
/// assert_eq!(edges.dangling_pairs, 1);
/// assert!(graph.contains_edge("b", "a"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyGraph {
    neighbours: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl AdjacencyGraph {
    /// Insert the undirected edge `a`-`b`, returning whether it was new.
    pub fn add_edge(&mut self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        let forward = self.link(a, b);
        let backward = self.link(b, a);
        forward || backward
    }

    fn link(&mut self, from: &str, to: &str) -> bool {
        match self.neighbours.get_mut(from) {
            Some(set) => {
                if set.contains(to) {
                    false
                } else {
                    set.insert(to.to_owned())
                }
            }
            None => {
                self.neighbours
                    .insert(from.to_owned(), BTreeSet::from([to.to_owned()]));
                true
            }
        }
    }

    /// Add edges for every consecutive pair of the way whose endpoints both
    /// pass `accepted`.
    pub fn add_way<M>(&mut self, way: &Way, accepted: &M) -> WayEdges
    where
        M: MembershipIndex + ?Sized,
    {
        let mut outcome = WayEdges::default();
        for (from, to) in way.node_pairs() {
            if accepted.might_contain(from) && accepted.might_contain(to) {
                outcome.linked_pairs += 1;
                if self.add_edge(from, to) {
                    outcome.new_edges += 1;
                }
            } else {
                outcome.dangling_pairs += 1;
            }
        }
        outcome
    }

    /// Neighbours of `id`, if it has any.
    #[must_use]
    pub fn neighbours(&self, id: &str) -> Option<&BTreeSet<NodeId>> {
        self.neighbours.get(id)
    }

    /// Whether the undirected edge `a`-`b` exists.
    #[must_use]
    pub fn contains_edge(&self, a: &str, b: &str) -> bool {
        self.neighbours
            .get(a)
            .is_some_and(|set| set.contains(b))
    }

    /// Number of nodes with at least one neighbour.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.neighbours.len()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.neighbours.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Whether the graph holds no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }

    /// Iterate over `(node, neighbours)` entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &BTreeSet<NodeId>)> {
        self.neighbours.iter()
    }
}
