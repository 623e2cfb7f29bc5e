//! Focused unit tests covering build CLI configuration resolution.

use super::*;
use camino::Utf8PathBuf;
use osmgrid_core::{BoundingBox, MembershipMode, PartitionPrecision, TagWhitelist};
use osmgrid_data::IngestMode;
use rstest::{fixture, rstest};
use std::num::NonZeroUsize;

#[fixture]
fn args() -> BuildArgs {
    BuildArgs {
        osm_xml: Some(Utf8PathBuf::from("city.osm.bz2")),
        output: Some(Utf8PathBuf::from("out")),
        ..BuildArgs::default()
    }
}

#[rstest]
#[case(None, Some(Utf8PathBuf::from("out")), ARG_OSM_XML, ENV_OSM_XML)]
#[case(Some(Utf8PathBuf::from("city.osm")), None, ARG_OUTPUT, ENV_OUTPUT)]
fn converting_without_required_fields_errors(
    #[case] osm_xml: Option<Utf8PathBuf>,
    #[case] output: Option<Utf8PathBuf>,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let args = BuildArgs {
        osm_xml,
        output,
        ..BuildArgs::default()
    };
    let err = BuildConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn defaults_accept_everything(args: BuildArgs) {
    let config = BuildConfig::try_from(args).expect("valid arguments");
    assert_eq!(config.pipeline.area, None);
    assert!(config.pipeline.whitelist.is_empty());
    assert_eq!(config.pipeline.precision, PartitionPrecision::DEFAULT);
    assert_eq!(config.pipeline.membership.mode(), MembershipMode::Approximate);
    assert_eq!(config.pipeline.mode, IngestMode::SinglePass);
    assert!(!config.pipeline.tabulate_tags);
    assert!(matches!(config.sink, SinkTarget::Json(_)));
}

#[rstest]
fn resolves_every_pipeline_option(args: BuildArgs) {
    let args = BuildArgs {
        lat_min: Some(44.9),
        lat_max: Some(45.1),
        lon_min: Some(-93.4),
        lon_max: Some(-93.1),
        tags: Some("highway, railway".to_owned()),
        precision: Some(2),
        membership: Some("approximate".to_owned()),
        expected_nodes: Some(500),
        false_positive_rate: Some(0.001),
        mode: Some("pipelined".to_owned()),
        queue_depth: Some(64),
        tabulate_tags: Some(true),
        ..args
    };
    let config = BuildConfig::try_from(args).expect("valid arguments");
    let pipeline = &config.pipeline;
    assert_eq!(
        pipeline.area,
        Some(BoundingBox::new(44.9, 45.1, -93.4, -93.1).expect("valid box"))
    );
    assert_eq!(pipeline.whitelist, TagWhitelist::new(["highway", "railway"]));
    assert_eq!(pipeline.precision.digits(), 2);
    assert_eq!(pipeline.membership.expected_items(), 500);
    assert_eq!(
        pipeline.mode,
        IngestMode::Pipelined {
            queue_depth: NonZeroUsize::new(64).expect("non-zero")
        }
    );
    assert!(pipeline.tabulate_tags);
}

#[rstest]
#[case::partial_area(BuildArgs { lat_min: Some(1.0), ..BuildArgs::default() })]
#[case::inverted_area(BuildArgs {
    lat_min: Some(2.0),
    lat_max: Some(1.0),
    lon_min: Some(0.0),
    lon_max: Some(1.0),
    ..BuildArgs::default()
})]
#[case::precision(BuildArgs { precision: Some(16), ..BuildArgs::default() })]
#[case::membership(BuildArgs { membership: Some("fuzzy".to_owned()), ..BuildArgs::default() })]
#[case::rate(BuildArgs { false_positive_rate: Some(1.5), ..BuildArgs::default() })]
#[case::mode(BuildArgs { mode: Some("three-pass".to_owned()), ..BuildArgs::default() })]
#[case::queue(BuildArgs {
    mode: Some("pipelined".to_owned()),
    queue_depth: Some(0),
    ..BuildArgs::default()
})]
#[case::sink(BuildArgs { sink: Some("redis".to_owned()), ..BuildArgs::default() })]
#[case::template(BuildArgs { file_template: Some("{lat}.json".to_owned()), ..BuildArgs::default() })]
fn rejects_invalid_options(args: BuildArgs, #[case] overrides: BuildArgs) {
    let merged = BuildArgs {
        osm_xml: args.osm_xml,
        output: args.output,
        ..overrides
    };
    let err = BuildConfig::try_from(merged).expect_err("invalid option should error");
    assert!(
        matches!(
            err,
            CliError::IncompleteBoundingBox
                | CliError::InvalidSetting(_)
                | CliError::InvalidOption { .. }
                | CliError::WriteJson { .. }
        ),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn validate_sources_reports_missing_files() {
    let workspace = super::helpers::Workspace::new();
    let config = BuildConfig::try_from(BuildArgs {
        osm_xml: Some(workspace.root().join("absent.osm")),
        output: Some(workspace.root().join("out")),
        ..BuildArgs::default()
    })
    .expect("valid arguments");
    match config.validate_sources().expect_err("expected failure") {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_OSM_XML),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_directories() {
    let workspace = super::helpers::Workspace::new();
    let config = BuildConfig::try_from(BuildArgs {
        osm_xml: Some(workspace.root().to_path_buf()),
        output: Some(workspace.root().join("out")),
        ..BuildArgs::default()
    })
    .expect("valid arguments");
    match config.validate_sources().expect_err("expected failure") {
        CliError::SourcePathNotFile { field, .. } => assert_eq!(field, ARG_OSM_XML),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn parses_negative_coordinates_and_bare_flags() {
    let cli = Cli::try_parse_from([
        "osmgrid",
        "build",
        "--osm-xml",
        "city.osm",
        "--output",
        "out",
        "--lat-min",
        "44.9",
        "--lat-max",
        "45.1",
        "--lon-min",
        "-93.4",
        "--lon-max",
        "-93.1",
        "--tabulate-tags",
    ])
    .expect("arguments parse");
    let Command::Build(args) = cli.command;
    assert_eq!(args.lon_min, Some(-93.4));
    assert_eq!(args.tabulate_tags, Some(true));
}
