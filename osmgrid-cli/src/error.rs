//! Error types emitted by the osmgrid CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use osmgrid_core::ConfigError;
use osmgrid_data::{OsmIngestError, PersistGraphError, WriteJsonError};
use thiserror::Error;

/// Errors emitted by the osmgrid CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// Only some of the four bounding box edges were supplied.
    #[error("bounding box needs all of --lat-min, --lat-max, --lon-min and --lon-max")]
    IncompleteBoundingBox,
    /// An option carried a value outside its accepted set.
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidOption {
        field: &'static str,
        value: String,
        reason: String,
    },
    /// A pipeline setting failed validation.
    #[error("invalid pipeline setting: {0}")]
    InvalidSetting(#[from] ConfigError),
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// OSM ingestion failed.
    #[error("failed to ingest OSM data: {0}")]
    OsmIngest(#[from] OsmIngestError),
    /// Persisting the graph to SQLite failed.
    #[error("failed to persist graph to {path:?}: {source}")]
    PersistGraph {
        path: Utf8PathBuf,
        #[source]
        source: PersistGraphError,
    },
    /// Writing partition JSON files failed.
    #[error("failed to write partitions into {path:?}: {source}")]
    WriteJson {
        path: Utf8PathBuf,
        #[source]
        source: WriteJsonError,
    },
}
