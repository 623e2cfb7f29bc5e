//! OSM XML ingestion into a partitioned adjacency graph.
//!
//! A run streams [`Record`]s out of the XML, filters points against the
//! configured area and ways against the tag whitelist, and grows the adjacency
//! graph over accepted points. After the input is exhausted the accepted
//! points are partitioned and returned in an [`IngestReport`].
//!
//! Three traversal strategies are offered through [`IngestMode`]:
//! single-pass (points must precede the ways that use them), pipelined
//! (parsing moved to a worker thread behind a bounded queue) and two-pass
//! (points first, then ways, for inputs with arbitrary element order).

use std::{
    io::BufRead,
    num::NonZeroUsize,
    sync::mpsc::{self, SyncSender},
    thread,
};

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use osmgrid_core::{ConfigError, PartitionedGraph, TagCount};
use thiserror::Error;

use crate::xml::ElementStreamError;

mod accumulator;
mod builder;
mod config;
mod progress;
mod records;
mod source;
mod summary;

pub use accumulator::{Accumulator, AccumulatorError, Record};
pub use builder::GraphBuilder;
pub use config::{DEFAULT_QUEUE_DEPTH, IngestMode, ParseIngestModeError, PipelineConfig};
pub use progress::{LogProgress, NoProgress, ProgressObserver};
pub use records::RecordStream;
pub use source::{XmlSource, is_bz2, open_xml_source};
pub use summary::{OsmIngestSummary, WayVerdict};

/// Result of a completed ingest run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    /// Element counts and filter outcomes.
    pub summary: OsmIngestSummary,
    /// Partitioned accepted points with their neighbours.
    pub graph: PartitionedGraph,
    /// Tag keys by descending frequency; empty unless tabulation was enabled.
    pub tag_counts: Vec<TagCount>,
}

/// Errors returned when ingesting OSM XML.
#[derive(Debug, Error)]
pub enum OsmIngestError {
    /// The input file could not be opened.
    #[error("failed to open OSM XML file at {path:?}")]
    Open {
        /// Path that failed to open.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document was malformed.
    #[error("failed to read OSM XML")]
    Stream {
        /// Element stream error.
        #[source]
        source: ElementStreamError,
    },
    /// Elements were nested in an unsupported way.
    #[error("invalid element nesting near byte {position}")]
    State {
        /// Byte offset near the offending element.
        position: usize,
        /// Accumulator error.
        #[source]
        source: AccumulatorError,
    },
    /// The pipeline configuration was rejected.
    #[error("invalid pipeline configuration")]
    Config(#[from] ConfigError),
    /// Two-pass ingestion needs a file it can reopen.
    #[error("{mode} ingestion requires a file path")]
    UnsupportedMode {
        /// Requested mode.
        mode: IngestMode,
    },
    /// The parsing worker thread panicked.
    #[error("OSM XML parsing worker panicked")]
    Worker,
}

/// Ingest an OSM XML file, logging progress through the `log` facade.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use osmgrid_data::{PipelineConfig, ingest_osm_xml};
///
/// # fn main() -> Result<(), osmgrid_data::OsmIngestError> {
/// let report = ingest_osm_xml(Utf8Path::new("minneapolis.osm.bz2"), &PipelineConfig::default())?;
/// println!("{} partitions", report.graph.partition_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_osm_xml(
    path: &Utf8Path,
    config: &PipelineConfig,
) -> Result<IngestReport, OsmIngestError> {
    ingest_osm_xml_with(path, config, &mut LogProgress::default())
}

/// Ingest an OSM XML file, reporting milestones to `observer`.
pub fn ingest_osm_xml_with<O>(
    path: &Utf8Path,
    config: &PipelineConfig,
    observer: &mut O,
) -> Result<IngestReport, OsmIngestError>
where
    O: ProgressObserver + ?Sized,
{
    info!("ingesting {path} in {} mode", config.mode);
    match config.mode {
        IngestMode::TwoPass => {
            let mut builder = GraphBuilder::new(config)?;
            debug!("first pass: collecting points");
            consume(
                RecordStream::new(open_xml_source(path)?),
                &mut builder,
                observer,
                Pass::PointsOnly,
            )?;
            debug!("second pass: linking ways");
            consume(
                RecordStream::new(open_xml_source(path)?),
                &mut builder,
                observer,
                Pass::WaysOnly,
            )?;
            Ok(complete(builder, observer))
        }
        IngestMode::SinglePass | IngestMode::Pipelined { .. } => {
            ingest_osm_xml_reader(open_xml_source(path)?, config, observer)
        }
    }
}

/// Ingest OSM XML from an already open byte source.
///
/// Only single-pass and pipelined modes can work on a source that cannot be
/// reopened; two-pass mode fails with [`OsmIngestError::UnsupportedMode`].
///
/// # Examples
/// ```
/// use osmgrid_data::{NoProgress, PipelineConfig, ingest_osm_xml_reader};
///
/// let xml = r#"<osm>
///   <node id="a" lat="1.0" lon="1.0"/>
///   <node id="b" lat="1.0" lon="1.0001"/>
///   <way><nd ref="a"/><nd ref="b"/><tag k="highway" v="path"/></way>
/// </osm>"#;
/// let report = ingest_osm_xml_reader(xml.as_bytes(), &PipelineConfig::default(), &mut NoProgress)
///     .expect("valid document");
/// assert_eq!(report.graph.edge_count(), 1);
/// ```
pub fn ingest_osm_xml_reader<R, O>(
    source: R,
    config: &PipelineConfig,
    observer: &mut O,
) -> Result<IngestReport, OsmIngestError>
where
    R: BufRead + Send,
    O: ProgressObserver + ?Sized,
{
    let mut builder = GraphBuilder::new(config)?;
    match config.mode {
        IngestMode::SinglePass => {
            consume(RecordStream::new(source), &mut builder, observer, Pass::All)?;
        }
        IngestMode::Pipelined { queue_depth } => {
            consume_pipelined(source, queue_depth, &mut builder, observer)?;
        }
        mode @ IngestMode::TwoPass => return Err(OsmIngestError::UnsupportedMode { mode }),
    }
    Ok(complete(builder, observer))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    All,
    PointsOnly,
    WaysOnly,
}

fn consume<I, O>(
    records: I,
    builder: &mut GraphBuilder<'_>,
    observer: &mut O,
    pass: Pass,
) -> Result<(), OsmIngestError>
where
    I: IntoIterator<Item = Result<Record, OsmIngestError>>,
    O: ProgressObserver + ?Sized,
{
    for record in records {
        apply(record?, builder, observer, pass);
    }
    Ok(())
}

fn apply<O>(record: Record, builder: &mut GraphBuilder<'_>, observer: &mut O, pass: Pass)
where
    O: ProgressObserver + ?Sized,
{
    match record {
        Record::Point(point) if pass != Pass::WaysOnly => {
            builder.add_point(point);
            observer.point_processed(builder.summary());
        }
        Record::Way(way) if pass != Pass::PointsOnly => {
            builder.add_way(&way);
            observer.way_processed(builder.summary());
        }
        Record::Point(_) | Record::Way(_) => {}
    }
}

/// Parse on a scoped worker thread and apply records on the caller's thread.
///
/// Records cross a bounded channel in document order, so the consumer sees
/// exactly the sequence a single-pass run would.
fn consume_pipelined<R, O>(
    source: R,
    queue_depth: NonZeroUsize,
    builder: &mut GraphBuilder<'_>,
    observer: &mut O,
) -> Result<(), OsmIngestError>
where
    R: BufRead + Send,
    O: ProgressObserver + ?Sized,
{
    let (sender, receiver) = mpsc::sync_channel(queue_depth.get());
    thread::scope(|scope| {
        let producer = scope.spawn(move || produce(source, &sender));
        let consumed = consume(receiver, builder, observer, Pass::All);
        let joined = producer.join().map_err(|_| OsmIngestError::Worker);
        consumed.and(joined)
    })
}

fn produce<R: BufRead>(source: R, sender: &SyncSender<Result<Record, OsmIngestError>>) {
    for record in RecordStream::new(source) {
        if sender.send(record).is_err() {
            debug!("record consumer stopped early; halting parser");
            return;
        }
    }
}

fn complete<O>(builder: GraphBuilder<'_>, observer: &mut O) -> IngestReport
where
    O: ProgressObserver + ?Sized,
{
    observer.finished(builder.summary());
    builder.finish()
}
