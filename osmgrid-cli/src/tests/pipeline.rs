//! Pipeline integration tests covering the build command flow.

use super::helpers::Workspace;
use super::*;
use camino::Utf8PathBuf;
use rstest::rstest;
use rusqlite::Connection;
use serde_json::{Value, json};
use std::fs;

fn build_args(workspace: &Workspace, output: Utf8PathBuf) -> BuildArgs {
    BuildArgs {
        osm_xml: Some(workspace.extract().to_path_buf()),
        output: Some(output),
        lat_min: Some(0.0),
        lat_max: Some(2.0),
        lon_min: Some(0.0),
        lon_max: Some(2.0),
        tags: Some("highway".to_owned()),
        membership: Some("exact".to_owned()),
        ..BuildArgs::default()
    }
}

#[rstest]
fn build_writes_json_partitions() {
    let workspace = Workspace::new();
    let output = workspace.root().join("graph");
    let args = BuildArgs {
        tabulate_tags: Some(true),
        ..build_args(&workspace, output.clone())
    };

    let outcome = BuildConfig::try_from(args)
        .and_then(BuildConfig::execute)
        .expect("build should succeed");
    assert_eq!(outcome.output, output);
    assert_eq!(outcome.node_count, 2);
    assert_eq!(outcome.edge_count, 1);
    assert_eq!(outcome.partition_count, 1);
    assert_eq!(outcome.summary.ways_rejected_by_tag, 1);
    let keys: Vec<_> = outcome.tag_counts.iter().map(|tag| tag.key.as_str()).collect();
    assert_eq!(keys, ["building", "highway"]);

    let raw = fs::read_to_string(output.join("1.000_1.000.json")).expect("partition file");
    let nodes: Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(
        nodes,
        json!([
            {"id": "A", "lat": 1.0, "lon": 1.0, "adjacency": ["B"]},
            {"id": "B", "lat": 1.0, "lon": 1.0001, "adjacency": ["A"]},
        ])
    );
}

#[rstest]
fn build_writes_sqlite_database() {
    let workspace = Workspace::new();
    let database = workspace.root().join("artefacts/graph.db");
    let args = BuildArgs {
        sink: Some("sqlite".to_owned()),
        mode: Some("two-pass".to_owned()),
        ..build_args(&workspace, database.clone())
    };

    let outcome = BuildConfig::try_from(args)
        .and_then(BuildConfig::execute)
        .expect("build should succeed");
    assert_eq!(outcome.edge_count, 1);

    let conn = Connection::open(database.as_std_path()).expect("open graph.db");
    let nodes: i64 = conn
        .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))
        .expect("count nodes");
    let edges: i64 = conn
        .query_row("SELECT COUNT(*) FROM node_adjacency", [], |row| row.get(0))
        .expect("count adjacency rows");
    assert_eq!((nodes, edges), (2, 2));
}

#[rstest]
fn build_errors_when_extract_missing() {
    let workspace = Workspace::new();
    let args = BuildArgs {
        osm_xml: Some(workspace.root().join("absent.osm")),
        ..build_args(&workspace, workspace.root().join("graph"))
    };
    let err = BuildConfig::try_from(args)
        .and_then(BuildConfig::execute)
        .expect_err("missing extract should fail");
    assert!(
        matches!(err, CliError::MissingSourceFile { .. }),
        "unexpected error {err:?}"
    );
    assert!(!workspace.root().join("graph").exists());
}
