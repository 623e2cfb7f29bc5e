//! Command-line interface for building partitioned OSM graphs.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod build;
mod error;

pub use build::{BuildConfig, BuildOutcome, SinkTarget};
pub use error::CliError;

use build::BuildArgs;

const ARG_OSM_XML: &str = "osm-xml";
const ARG_OUTPUT: &str = "output";
const ARG_LAT_MIN: &str = "lat-min";
const ARG_LAT_MAX: &str = "lat-max";
const ARG_LON_MIN: &str = "lon-min";
const ARG_LON_MAX: &str = "lon-max";
const ARG_TAGS: &str = "tags";
const ARG_PRECISION: &str = "precision";
const ARG_MEMBERSHIP: &str = "membership";
const ARG_EXPECTED_NODES: &str = "expected-nodes";
const ARG_FALSE_POSITIVE_RATE: &str = "false-positive-rate";
const ARG_MODE: &str = "mode";
const ARG_QUEUE_DEPTH: &str = "queue-depth";
const ARG_SINK: &str = "sink";
const ARG_FILE_TEMPLATE: &str = "file-template";
const ARG_TABULATE_TAGS: &str = "tabulate-tags";
const ENV_OSM_XML: &str = "OSMGRID_CMDS_BUILD_OSM_XML";
const ENV_OUTPUT: &str = "OSMGRID_CMDS_BUILD_OUTPUT";

/// Run the osmgrid CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Build(args) => {
            let outcome = build::run_build(args)?;
            for tag in &outcome.tag_counts {
                println!("{}\t{}", tag.count, tag.key);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(
    name = "osmgrid",
    about = "Turn OpenStreetMap XML extracts into partitioned adjacency graphs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Filter an OSM XML extract and write its partitioned graph.
    Build(BuildArgs),
}

#[cfg(test)]
mod tests;
