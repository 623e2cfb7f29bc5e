//! Behavioural tests for the `ingest_osm_xml` entry point and the JSON sink.

use camino::Utf8PathBuf;
use osmgrid_core::{BoundingBox, GraphSink, MembershipConfig, PartitionKey, TagWhitelist};
use osmgrid_data::{
    IngestReport, JsonPartitionSink, NoProgress, OsmIngestError, PipelineConfig,
    ingest_osm_xml_with,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use std::{cell::RefCell, fs};
use tempfile::TempDir;

mod support;

type Outcome = RefCell<Option<Result<IngestReport, OsmIngestError>>>;

#[fixture]
fn target_path() -> RefCell<Option<Utf8PathBuf>> {
    RefCell::new(None)
}

#[fixture]
fn ingestion_result() -> Outcome {
    RefCell::new(None)
}

#[fixture]
fn output_dir() -> RefCell<Option<TempDir>> {
    RefCell::new(None)
}

fn expect_report(result: &Outcome) -> IngestReport {
    result
        .borrow()
        .as_ref()
        .expect("ingestion was attempted")
        .as_ref()
        .expect("expected successful ingestion")
        .clone()
}

#[given("an OSM XML file with three points and two ways")]
fn three_points(#[from(target_path)] target: &RefCell<Option<Utf8PathBuf>>) {
    *target.borrow_mut() = Some(support::fixture("three_points.osm"));
}

#[given("a path to a missing OSM XML file")]
fn missing_file(#[from(target_path)] target: &RefCell<Option<Utf8PathBuf>>) {
    *target.borrow_mut() = Some(support::fixtures_dir().join("missing.osm"));
}

#[given("an OSM XML file with a point lacking a latitude")]
fn truncated_file(#[from(target_path)] target: &RefCell<Option<Utf8PathBuf>>) {
    *target.borrow_mut() = Some(support::fixture("truncated.osm"));
}

#[when("I ingest the file keeping highways between latitude 0 and 2")]
fn ingest_highways(
    #[from(target_path)] target: &RefCell<Option<Utf8PathBuf>>,
    #[from(ingestion_result)] result: &Outcome,
) {
    let config = PipelineConfig::default()
        .with_area(BoundingBox::new(0.0, 2.0, 0.0, 2.0).expect("valid area"))
        .with_whitelist(TagWhitelist::new(["highway"]))
        .with_membership(MembershipConfig::exact(8));
    let outcome = {
        let guard = target.borrow();
        let path = guard.as_ref().expect("target path prepared");
        ingest_osm_xml_with(path, &config, &mut NoProgress)
    };
    *result.borrow_mut() = Some(outcome);
}

#[when("I write the graph to a JSON directory")]
fn write_json(
    #[from(ingestion_result)] result: &Outcome,
    #[from(output_dir)] output: &RefCell<Option<TempDir>>,
) {
    let report = expect_report(result);
    let dir = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
    JsonPartitionSink::new(root)
        .persist(&report.graph)
        .expect("persist partitions");
    *output.borrow_mut() = Some(dir);
}

#[then("only points A and B are linked")]
fn only_a_and_b(#[from(ingestion_result)] result: &Outcome) {
    let report = expect_report(result);
    assert_eq!(report.graph.edge_count(), 1, "expected a single edge");
    let cell = report
        .graph
        .partition(&PartitionKey::new("1.000", "1.000"))
        .expect("A and B share a partition");
    let linked: Vec<(&str, Vec<&str>)> = cell
        .iter()
        .map(|node| {
            (
                node.id.as_str(),
                node.adjacency.iter().map(String::as_str).collect(),
            )
        })
        .collect();
    assert_eq!(linked, [("A", vec!["B"]), ("B", vec!["A"])]);
}

#[then("point C is absent from the partition map")]
fn c_absent(#[from(ingestion_result)] result: &Outcome) {
    let report = expect_report(result);
    assert!(report.graph.partition_of("C").is_none());
    assert_eq!(report.graph.node_count(), 2);
    assert_eq!(report.summary.points_seen, 3);
    assert_eq!(report.summary.points_accepted, 2);
}

#[then("the building way is rejected by tag")]
fn building_rejected(#[from(ingestion_result)] result: &Outcome) {
    let report = expect_report(result);
    assert_eq!(report.summary.ways_seen, 2);
    assert_eq!(report.summary.ways_accepted, 1);
    assert_eq!(report.summary.ways_rejected_by_tag, 1);
    assert_eq!(report.summary.dangling_pairs, 1);
}

#[then("an open error is returned")]
fn open_error(#[from(ingestion_result)] result: &Outcome) {
    let borrowed = result.borrow();
    match borrowed.as_ref().expect("ingestion was attempted") {
        Ok(_) => panic!("expected an error for the missing file"),
        Err(OsmIngestError::Open { path, .. }) => {
            assert!(
                path.as_str().ends_with("missing.osm"),
                "unexpected path in error: {path:?}"
            );
        }
        Err(other) => panic!("expected an open error, got {other:?}"),
    }
}

#[then("a malformed input error is returned")]
fn malformed_error(#[from(ingestion_result)] result: &Outcome) {
    let borrowed = result.borrow();
    match borrowed.as_ref().expect("ingestion was attempted") {
        Ok(_) => panic!("expected an error for the truncated point"),
        Err(OsmIngestError::Stream { source }) => {
            assert!(
                source.to_string().contains("lat"),
                "error should name the missing attribute: {source}"
            );
        }
        Err(other) => panic!("expected a stream error, got {other:?}"),
    }
}

#[then("one partition file holds points A and B")]
fn partition_file(#[from(output_dir)] output: &RefCell<Option<TempDir>>) {
    let guard = output.borrow();
    let dir = guard.as_ref().expect("output written");
    let raw = fs::read_to_string(dir.path().join("1.000_1.000.json")).expect("partition file");
    let nodes: Value = serde_json::from_str(&raw).expect("valid json");
    let ids: Vec<&str> = nodes
        .as_array()
        .expect("partition array")
        .iter()
        .filter_map(|node| node.get("id").and_then(Value::as_str))
        .collect();
    assert_eq!(ids, ["A", "B"]);
    assert!(dir.path().join("partitions.json").is_file());
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature = support::fixtures_dir()
        .parent()
        .expect("tests directory")
        .join("features/ingest_osm_xml.feature");
    let contents = fs::read_to_string(&feature).unwrap_or_else(|err| {
        panic!("failed to read feature file {feature}: {err}");
    });
    let titles: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .collect();
    assert_eq!(
        titles,
        [
            "linking points inside the area",
            "reporting a missing file",
            "rejecting malformed XML",
            "writing partitions as JSON",
        ],
        "scenario order changed in feature file"
    );
}

#[scenario(path = "tests/features/ingest_osm_xml.feature", index = 0)]
fn linking_points_inside_area(
    target_path: RefCell<Option<Utf8PathBuf>>,
    ingestion_result: Outcome,
    output_dir: RefCell<Option<TempDir>>,
) {
    let _ = (target_path, ingestion_result, output_dir);
}

#[scenario(path = "tests/features/ingest_osm_xml.feature", index = 1)]
fn reporting_missing_files(
    target_path: RefCell<Option<Utf8PathBuf>>,
    ingestion_result: Outcome,
    output_dir: RefCell<Option<TempDir>>,
) {
    let _ = (target_path, ingestion_result, output_dir);
}

#[scenario(path = "tests/features/ingest_osm_xml.feature", index = 2)]
fn rejecting_malformed_xml(
    target_path: RefCell<Option<Utf8PathBuf>>,
    ingestion_result: Outcome,
    output_dir: RefCell<Option<TempDir>>,
) {
    let _ = (target_path, ingestion_result, output_dir);
}

#[scenario(path = "tests/features/ingest_osm_xml.feature", index = 3)]
fn writing_partitions_as_json(
    target_path: RefCell<Option<Utf8PathBuf>>,
    ingestion_result: Outcome,
    output_dir: RefCell<Option<TempDir>>,
) {
    let _ = (target_path, ingestion_result, output_dir);
}
