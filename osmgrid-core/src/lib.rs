//! Core domain types for the osmgrid pipeline.
//!
//! The crate models the pieces that turn a stream of finalised OSM records
//! into a partitioned adjacency graph:
//! - [`Point`] and [`Way`] records produced by the element stream;
//! - the spatial ([`BoundingBox`]) and semantic ([`TagWhitelist`]) filters;
//! - the accepted-node [`MembershipIndex`] in exact and Bloom-filter flavours;
//! - the undirected [`AdjacencyGraph`];
//! - grid partitioning via [`PartitionAssigner`] and the final
//!   [`PartitionedGraph`] handed to a [`GraphSink`].
//!
//! Constructors for configuration values validate their input and return
//! `Result` so that invalid settings surface before a multi-gigabyte pass
//! starts.

pub mod aggregate;
pub mod bounds;
pub mod error;
pub mod graph;
pub mod membership;
pub mod partition;
pub mod point;
pub mod sink;
pub mod tally;
pub mod tags;
pub mod way;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use aggregate::{PartitionedGraph, PartitionedNode, aggregate};
pub use bounds::BoundingBox;
pub use error::ConfigError;
pub use graph::{AdjacencyGraph, WayEdges};
pub use membership::{
    AcceptedNodes, BloomIndex, ExactIndex, MembershipConfig, MembershipIndex, MembershipMode,
};
pub use partition::{PartitionAssigner, PartitionKey, PartitionPrecision};
pub use point::{NodeId, Point};
pub use sink::GraphSink;
pub use tally::{TagCount, TagTally};
pub use tags::TagWhitelist;
pub use way::{Tags, Way};
