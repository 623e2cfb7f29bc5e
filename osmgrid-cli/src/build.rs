//! Build command implementation for the osmgrid CLI.

use std::num::NonZeroUsize;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use osmgrid_core::membership::{DEFAULT_EXPECTED_ITEMS, DEFAULT_FALSE_POSITIVE_RATE};
use osmgrid_core::{
    BoundingBox, GraphSink, MembershipConfig, MembershipMode, PartitionPrecision, TagCount,
    TagWhitelist,
};
use osmgrid_data::{
    IngestMode, JsonPartitionSink, OsmIngestSummary, PipelineConfig, SqliteGraphSink,
    ingest_osm_xml,
};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_EXPECTED_NODES, ARG_FALSE_POSITIVE_RATE, ARG_FILE_TEMPLATE, ARG_LAT_MAX, ARG_LAT_MIN,
    ARG_LON_MAX, ARG_LON_MIN, ARG_MEMBERSHIP, ARG_MODE, ARG_OSM_XML, ARG_OUTPUT, ARG_PRECISION,
    ARG_QUEUE_DEPTH, ARG_SINK, ARG_TABULATE_TAGS, ARG_TAGS, CliError, ENV_OSM_XML, ENV_OUTPUT,
};

/// CLI arguments for the `build` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Stream an OSM XML extract (optionally bzip2-compressed), keep \
                 the points inside a bounding box, link them along ways whose \
                 tags match the whitelist and write the graph partitioned \
                 into a latitude/longitude grid. Options can come from CLI \
                 flags, configuration files, or environment variables.",
    about = "Build a partitioned adjacency graph from OSM XML"
)]
#[ortho_config(prefix = "OSMGRID")]
pub(crate) struct BuildArgs {
    /// Path to the OSM XML extract (`.osm` or `.osm.bz2`).
    #[arg(long = ARG_OSM_XML, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_xml: Option<Utf8PathBuf>,
    /// Output directory for JSON partitions, or database file for SQLite.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Southern edge of the bounding box in degrees.
    #[arg(long = ARG_LAT_MIN, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat_min: Option<f64>,
    /// Northern edge of the bounding box in degrees.
    #[arg(long = ARG_LAT_MAX, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat_max: Option<f64>,
    /// Western edge of the bounding box in degrees.
    #[arg(long = ARG_LON_MIN, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon_min: Option<f64>,
    /// Eastern edge of the bounding box in degrees.
    #[arg(long = ARG_LON_MAX, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon_max: Option<f64>,
    /// Comma-separated tag keys a way must carry, e.g. `highway,railway`.
    #[arg(long = ARG_TAGS, value_name = "keys")]
    #[serde(default)]
    pub(crate) tags: Option<String>,
    /// Decimal digits kept in partition keys (0-15, default 3).
    #[arg(long = ARG_PRECISION, value_name = "digits")]
    #[serde(default)]
    pub(crate) precision: Option<u8>,
    /// Accepted-node index: `exact` or `approximate` (default).
    #[arg(long = ARG_MEMBERSHIP, value_name = "mode")]
    #[serde(default)]
    pub(crate) membership: Option<String>,
    /// Expected number of accepted points, used to size the index.
    #[arg(long = ARG_EXPECTED_NODES, value_name = "count")]
    #[serde(default)]
    pub(crate) expected_nodes: Option<usize>,
    /// Target false-positive rate of the approximate index.
    #[arg(long = ARG_FALSE_POSITIVE_RATE, value_name = "rate")]
    #[serde(default)]
    pub(crate) false_positive_rate: Option<f64>,
    /// Traversal: `single-pass` (default), `pipelined` or `two-pass`.
    #[arg(long = ARG_MODE, value_name = "mode")]
    #[serde(default)]
    pub(crate) mode: Option<String>,
    /// Bounded queue length between parser and consumer in pipelined mode.
    #[arg(long = ARG_QUEUE_DEPTH, value_name = "records")]
    #[serde(default)]
    pub(crate) queue_depth: Option<usize>,
    /// Output format: `json` (default) or `sqlite`.
    #[arg(long = ARG_SINK, value_name = "kind")]
    #[serde(default)]
    pub(crate) sink: Option<String>,
    /// JSON partition file name template containing `{lat}` and `{lon}`.
    #[arg(long = ARG_FILE_TEMPLATE, value_name = "template")]
    #[serde(default)]
    pub(crate) file_template: Option<String>,
    /// Count tag keys across all ways and print them by frequency.
    #[arg(
        long = ARG_TABULATE_TAGS,
        value_name = "bool",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) tabulate_tags: Option<bool>,
}

impl BuildArgs {
    pub(crate) fn into_config(self) -> Result<BuildConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        BuildConfig::try_from(merged)
    }
}

/// Destination for the partitioned graph.
#[derive(Debug, Clone)]
pub enum SinkTarget {
    /// Per-partition JSON files in a directory.
    Json(JsonPartitionSink),
    /// A single SQLite database.
    Sqlite(SqliteGraphSink),
}

impl SinkTarget {
    /// Directory or database file written by the sink.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Json(sink) => sink.directory(),
            Self::Sqlite(sink) => sink.path(),
        }
    }

    fn persist(&mut self, graph: &osmgrid_core::PartitionedGraph) -> Result<(), CliError> {
        let path = self.path().to_path_buf();
        match self {
            Self::Json(sink) => sink
                .persist(graph)
                .map_err(|source| CliError::WriteJson { path, source }),
            Self::Sqlite(sink) => sink
                .persist(graph)
                .map_err(|source| CliError::PersistGraph { path, source }),
        }
    }
}

/// Resolved `build` command configuration.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// OSM XML input.
    pub osm_xml: Utf8PathBuf,
    /// Filters, partitioning and traversal settings.
    pub pipeline: PipelineConfig,
    /// Where the graph is written.
    pub sink: SinkTarget,
}

/// What a successful build produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    /// Directory or database file written.
    pub output: Utf8PathBuf,
    /// Element counts and filter outcomes.
    pub summary: OsmIngestSummary,
    /// Accepted points written.
    pub node_count: usize,
    /// Partitions written.
    pub partition_count: usize,
    /// Undirected edges written.
    pub edge_count: usize,
    /// Tag keys by frequency when tabulation was requested.
    pub tag_counts: Vec<TagCount>,
}

impl BuildConfig {
    /// Ingest the input and persist the partitioned graph.
    pub fn execute(mut self) -> Result<BuildOutcome, CliError> {
        self.validate_sources()?;
        let report = ingest_osm_xml(&self.osm_xml, &self.pipeline)?;
        self.sink.persist(&report.graph)?;
        let outcome = BuildOutcome {
            output: self.sink.path().to_path_buf(),
            node_count: report.graph.node_count(),
            partition_count: report.graph.partition_count(),
            edge_count: report.graph.edge_count(),
            summary: report.summary,
            tag_counts: report.tag_counts,
        };
        info!(
            "built {} nodes, {} edges in {} partitions at {}",
            outcome.node_count, outcome.edge_count, outcome.partition_count, outcome.output
        );
        Ok(outcome)
    }

    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        let path = &self.osm_xml;
        match osmgrid_fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field: ARG_OSM_XML,
                path: path.clone(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field: ARG_OSM_XML,
                    path: path.clone(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_OSM_XML,
                path: path.clone(),
                source,
            }),
        }
    }
}

impl TryFrom<BuildArgs> for BuildConfig {
    type Error = CliError;

    fn try_from(args: BuildArgs) -> Result<Self, Self::Error> {
        let osm_xml = args.osm_xml.ok_or(CliError::MissingArgument {
            field: ARG_OSM_XML,
            env: ENV_OSM_XML,
        })?;
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT,
            env: ENV_OUTPUT,
        })?;

        let area = resolve_area(args.lat_min, args.lat_max, args.lon_min, args.lon_max)?;
        let whitelist = args
            .tags
            .as_deref()
            .map(TagWhitelist::from_csv)
            .unwrap_or_default();
        let precision = args
            .precision
            .map(PartitionPrecision::new)
            .transpose()?
            .unwrap_or_default();
        let membership = resolve_membership(
            args.membership.as_deref(),
            args.expected_nodes,
            args.false_positive_rate,
        )?;
        let mode = resolve_mode(args.mode.as_deref(), args.queue_depth)?;

        let sink = match args.sink.as_deref().map(str::trim) {
            None | Some("json") => {
                let sink = JsonPartitionSink::new(output.clone());
                let sink = match args.file_template {
                    Some(template) => sink
                        .with_template(template)
                        .map_err(|source| CliError::WriteJson {
                            path: output,
                            source,
                        })?,
                    None => sink,
                };
                SinkTarget::Json(sink)
            }
            Some("sqlite") => SinkTarget::Sqlite(SqliteGraphSink::new(output)),
            Some(other) => {
                return Err(invalid_option(ARG_SINK, other, "expected `json` or `sqlite`"));
            }
        };

        let mut pipeline = PipelineConfig::default()
            .with_whitelist(whitelist)
            .with_precision(precision)
            .with_membership(membership)
            .with_mode(mode)
            .with_tag_tabulation(args.tabulate_tags.unwrap_or(false));
        pipeline.area = area;

        Ok(Self {
            osm_xml,
            pipeline,
            sink,
        })
    }
}

fn invalid_option(field: &'static str, value: &str, reason: impl ToString) -> CliError {
    CliError::InvalidOption {
        field,
        value: value.to_owned(),
        reason: reason.to_string(),
    }
}

fn resolve_area(
    lat_min: Option<f64>,
    lat_max: Option<f64>,
    lon_min: Option<f64>,
    lon_max: Option<f64>,
) -> Result<Option<BoundingBox>, CliError> {
    match (lat_min, lat_max, lon_min, lon_max) {
        (None, None, None, None) => Ok(None),
        (Some(lat_min), Some(lat_max), Some(lon_min), Some(lon_max)) => {
            Ok(Some(BoundingBox::new(lat_min, lat_max, lon_min, lon_max)?))
        }
        _ => Err(CliError::IncompleteBoundingBox),
    }
}

fn resolve_membership(
    mode: Option<&str>,
    expected_nodes: Option<usize>,
    false_positive_rate: Option<f64>,
) -> Result<MembershipConfig, CliError> {
    let mode = mode
        .map(str::parse::<MembershipMode>)
        .transpose()?
        .unwrap_or_default();
    let expected = expected_nodes.unwrap_or(DEFAULT_EXPECTED_ITEMS);
    match mode {
        MembershipMode::Exact => Ok(MembershipConfig::exact(expected)),
        MembershipMode::Approximate => Ok(MembershipConfig::approximate(
            expected,
            false_positive_rate.unwrap_or(DEFAULT_FALSE_POSITIVE_RATE),
        )?),
    }
}

fn resolve_mode(mode: Option<&str>, queue_depth: Option<usize>) -> Result<IngestMode, CliError> {
    let parsed = match mode {
        Some(raw) => raw
            .parse::<IngestMode>()
            .map_err(|err| invalid_option(ARG_MODE, raw, err))?,
        None => IngestMode::default(),
    };
    match (parsed, queue_depth) {
        (IngestMode::Pipelined { .. }, Some(depth)) => {
            let queue_depth = NonZeroUsize::new(depth)
                .ok_or_else(|| invalid_option(ARG_QUEUE_DEPTH, &depth.to_string(), "must be positive"))?;
            Ok(IngestMode::Pipelined { queue_depth })
        }
        (mode, _) => Ok(mode),
    }
}

pub(crate) fn run_build(args: BuildArgs) -> Result<BuildOutcome, CliError> {
    args.into_config()?.execute()
}
