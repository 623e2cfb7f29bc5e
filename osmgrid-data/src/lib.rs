//! Data adapters for osmgrid.
//!
//! - [`xml`] turns OSM XML into typed [`ElementEvent`]s;
//! - [`ingest`] folds those events into records and drives the filtering and
//!   graph-building pipeline;
//! - [`sink`] persists the resulting [`osmgrid_core::PartitionedGraph`] to
//!   SQLite or to per-partition JSON files.
//!
//! # Examples
//! ```
//! use osmgrid_data::{ElementEvent, ElementStream};
//!
//! let xml = r#"<osm><node id="7" lat="44.97" lon="-93.25"/></osm>"#;
//! let events: Vec<_> = ElementStream::new(xml.as_bytes())
//!     .collect::<Result<_, _>>()
//!     .expect("well-formed document");
//! assert_eq!(events.last(), Some(&ElementEvent::PointClose));
//! ```

#![forbid(unsafe_code)]

pub mod ingest;
pub mod sink;
pub mod xml;

pub use ingest::{
    Accumulator, AccumulatorError, DEFAULT_QUEUE_DEPTH, GraphBuilder, IngestMode, IngestReport,
    LogProgress, NoProgress, OsmIngestError, OsmIngestSummary, ParseIngestModeError,
    PipelineConfig, ProgressObserver, Record, RecordStream, WayVerdict, XmlSource, ingest_osm_xml,
    ingest_osm_xml_reader, ingest_osm_xml_with, is_bz2, open_xml_source,
};
pub use sink::{
    DEFAULT_FILE_TEMPLATE, JsonPartitionSink, PARTITION_MAP_FILE, PersistGraphError,
    SqliteGraphSink, WriteJsonError,
};
pub use xml::{ElementEvent, ElementStream, ElementStreamError};
