//! Facade crate for osmgrid.
//!
//! osmgrid streams an OpenStreetMap XML extract, keeps the points inside a
//! bounding box, links them along ways whose tags match a whitelist and
//! partitions the resulting adjacency graph into a latitude/longitude grid.
//!
//! The domain types always come from `osmgrid-core`. The XML adapter, the
//! ingest pipeline and the SQLite and JSON sinks are re-exported behind the
//! default `data` feature.

#![forbid(unsafe_code)]

pub use osmgrid_core::{
    AdjacencyGraph, BoundingBox, ConfigError, GraphSink, MembershipConfig, MembershipIndex,
    MembershipMode, NodeId, PartitionAssigner, PartitionKey, PartitionPrecision, PartitionedGraph,
    PartitionedNode, Point, TagCount, TagWhitelist, Way, aggregate,
};

#[cfg(feature = "test-support")]
pub use osmgrid_core::test_support;

#[cfg(feature = "data")]
pub use osmgrid_data::{
    IngestMode, IngestReport, JsonPartitionSink, LogProgress, NoProgress, OsmIngestError,
    OsmIngestSummary, PersistGraphError, PipelineConfig, ProgressObserver, SqliteGraphSink,
    WriteJsonError, ingest_osm_xml, ingest_osm_xml_reader, ingest_osm_xml_with,
};
