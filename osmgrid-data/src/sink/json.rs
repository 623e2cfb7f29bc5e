//! One JSON document per partition plus a global partition map.

use std::collections::HashSet;
use std::io::{BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use log::{debug, info};
use osmgrid_core::{GraphSink, PartitionKey, PartitionedGraph};
use serde::Serialize;
use thiserror::Error;

/// File name pattern used when none is configured.
pub const DEFAULT_FILE_TEMPLATE: &str = "{lat}_{lon}.json";
/// Name of the identifier to partition map written alongside the partitions.
pub const PARTITION_MAP_FILE: &str = "partitions.json";

const LAT_PLACEHOLDER: &str = "{lat}";
const LON_PLACEHOLDER: &str = "{lon}";

/// Errors raised when writing partition JSON files.
#[derive(Debug, Error)]
pub enum WriteJsonError {
    /// The file name template cannot produce distinct plain file names.
    #[error(
        "file template {template:?} must contain {{lat}} and {{lon}} and no path separators"
    )]
    InvalidTemplate {
        /// Rejected template.
        template: String,
    },
    /// The output directory could not be created or opened.
    #[error("failed to prepare output directory {path:?}")]
    OutputDirectory {
        /// Output directory.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Serialising a document failed.
    #[error("failed to serialise {path:?}")]
    Serialize {
        /// Destination file.
        path: Utf8PathBuf,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Listing the output directory or removing a stale partition failed.
    #[error("failed to remove stale partitions from {path:?}")]
    Cleanup {
        /// Offending directory or file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Creating, writing or renaming a file failed.
    #[error("failed to write {path:?}")]
    Write {
        /// Destination file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Writes each partition as a JSON array of `{id, lat, lon, adjacency}`.
///
/// Files are written under a temporary name and renamed into place, so a
/// reader never observes a half-written partition. Once every partition is
/// written, files left by an earlier run whose names fit the template are
/// removed; other files in the directory are kept.
#[derive(Debug, Clone)]
pub struct JsonPartitionSink {
    directory: Utf8PathBuf,
    template: String,
}

impl JsonPartitionSink {
    /// Write into `directory` using [`DEFAULT_FILE_TEMPLATE`].
    pub fn new(directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            template: DEFAULT_FILE_TEMPLATE.to_owned(),
        }
    }

    /// Use a custom file name template containing `{lat}` and `{lon}`.
    pub fn with_template(mut self, template: impl Into<String>) -> Result<Self, WriteJsonError> {
        let template = template.into();
        let valid = template.contains(LAT_PLACEHOLDER)
            && template.contains(LON_PLACEHOLDER)
            && !template.contains(['/', '\\']);
        if !valid {
            return Err(WriteJsonError::InvalidTemplate { template });
        }
        self.template = template;
        Ok(self)
    }

    /// Output directory.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    /// File name for one partition.
    #[must_use]
    pub fn file_name(&self, key: &PartitionKey) -> String {
        self.template
            .replace(LAT_PLACEHOLDER, &key.lat)
            .replace(LON_PLACEHOLDER, &key.lon)
    }

    /// Whether `name` could have been produced by [`Self::file_name`].
    #[must_use]
    pub fn matches_template(&self, name: &str) -> bool {
        name != PARTITION_MAP_FILE && match_tokens(&template_tokens(&self.template), name)
    }

    fn remove_stale(
        &self,
        dir: &fs_utf8::Dir,
        written: &HashSet<String>,
    ) -> Result<usize, WriteJsonError> {
        let cleanup_error = |path: &Utf8Path| {
            let path = path.to_owned();
            move |source: std::io::Error| WriteJsonError::Cleanup { path, source }
        };
        let mut removed = 0;
        for entry in dir.entries().map_err(cleanup_error(&self.directory))? {
            let entry = entry.map_err(cleanup_error(&self.directory))?;
            // Names that are not UTF-8 cannot come from the template.
            let Ok(name) = entry.file_name() else {
                continue;
            };
            if written.contains(&name) || !self.matches_template(&name) {
                continue;
            }
            let is_file = entry
                .file_type()
                .map_err(cleanup_error(&self.directory))?
                .is_file();
            if !is_file {
                continue;
            }
            let path = self.directory.join(&name);
            dir.remove_file(&name).map_err(cleanup_error(&path))?;
            debug!("removed stale partition {path}");
            removed += 1;
        }
        Ok(removed)
    }

    fn write_document<T>(
        &self,
        dir: &fs_utf8::Dir,
        name: &str,
        document: &T,
    ) -> Result<(), WriteJsonError>
    where
        T: Serialize + ?Sized,
    {
        let path = self.directory.join(name);
        let staging = format!(".{name}.partial");
        let io_error = |source| WriteJsonError::Write {
            path: path.clone(),
            source,
        };

        let file = dir.create(&staging).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, document).map_err(|source| {
            WriteJsonError::Serialize {
                path: path.clone(),
                source,
            }
        })?;
        writer.flush().map_err(io_error)?;
        drop(writer);
        dir.rename(&staging, dir, name).map_err(io_error)?;
        debug!("wrote {path}");
        Ok(())
    }
}

impl GraphSink for JsonPartitionSink {
    type Error = WriteJsonError;

    fn persist(&mut self, graph: &PartitionedGraph) -> Result<(), Self::Error> {
        let dir = osmgrid_fs::create_dir_all(&self.directory).map_err(|source| {
            WriteJsonError::OutputDirectory {
                path: self.directory.clone(),
                source,
            }
        })?;
        let mut written = HashSet::new();
        for (key, nodes) in graph.partitions() {
            let name = self.file_name(key);
            self.write_document(&dir, &name, nodes.as_slice())?;
            written.insert(name);
        }
        self.write_document(&dir, PARTITION_MAP_FILE, graph.partition_map())?;
        let removed = self.remove_stale(&dir, &written)?;
        if removed > 0 {
            info!("removed {removed} stale partition files from {}", self.directory);
        }
        info!(
            "wrote {} partition files for {} nodes to {}",
            graph.partition_count(),
            graph.node_count(),
            self.directory
        );
        Ok(())
    }
}

enum Token<'a> {
    Literal(&'a str),
    Coordinate,
}

fn template_tokens(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = template;
    loop {
        let next = [LAT_PLACEHOLDER, LON_PLACEHOLDER]
            .iter()
            .filter_map(|placeholder| rest.find(*placeholder).map(|at| (at, placeholder.len())))
            .min();
        let Some((at, len)) = next else {
            break;
        };
        if at > 0 {
            tokens.push(Token::Literal(&rest[..at]));
        }
        tokens.push(Token::Coordinate);
        rest = &rest[at + len..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Literal(rest));
    }
    tokens
}

/// Partition keys are decimal strings: an optional sign, digits and a point.
fn coordinate_len(text: &str) -> usize {
    text.bytes()
        .take_while(|byte| byte.is_ascii_digit() || *byte == b'.' || *byte == b'-')
        .count()
}

fn match_tokens(tokens: &[Token<'_>], name: &str) -> bool {
    match tokens.split_first() {
        None => name.is_empty(),
        Some((Token::Literal(literal), rest)) => name
            .strip_prefix(literal)
            .is_some_and(|remainder| match_tokens(rest, remainder)),
        Some((Token::Coordinate, rest)) => {
            let longest = coordinate_len(name);
            (1..=longest).rev().any(|len| {
                name[..len].bytes().any(|byte| byte.is_ascii_digit())
                    && match_tokens(rest, &name[len..])
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osmgrid_core::{AdjacencyGraph, PartitionAssigner, Point, aggregate};
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::TempDir;

    #[fixture]
    fn graph() -> PartitionedGraph {
        let mut edges = AdjacencyGraph::default();
        edges.add_edge("A", "B");
        let points = [
            Point::new("A", 1.0, 1.0),
            Point::new("B", 1.0, 1.0001),
            Point::new("C", -0.5, 2.25),
        ];
        aggregate(&points, &edges, &PartitionAssigner::default())
    }

    fn read_json(path: &Utf8Path) -> Value {
        let raw = fs::read_to_string(path).expect("read output");
        serde_json::from_str(&raw).expect("valid json")
    }

    fn workspace() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        (dir, path)
    }

    #[rstest]
    fn writes_one_file_per_partition(graph: PartitionedGraph) {
        let (_guard, root) = workspace();
        let out = root.join("partitions");
        JsonPartitionSink::new(&out)
            .persist(&graph)
            .expect("persist");

        assert_eq!(
            read_json(&out.join("1.000_1.000.json")),
            json!([
                {"id": "A", "lat": 1.0, "lon": 1.0, "adjacency": ["B"]},
                {"id": "B", "lat": 1.0, "lon": 1.0001, "adjacency": ["A"]},
            ])
        );
        assert_eq!(
            read_json(&out.join("-0.500_2.250.json")),
            json!([{"id": "C", "lat": -0.5, "lon": 2.25, "adjacency": []}])
        );
        assert_eq!(
            read_json(&out.join(PARTITION_MAP_FILE)),
            json!({
                "A": {"lat": "1.000", "lon": "1.000"},
                "B": {"lat": "1.000", "lon": "1.000"},
                "C": {"lat": "-0.500", "lon": "2.250"},
            })
        );
        let leftovers = fs::read_dir(&out)
            .expect("list output")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".partial"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[rstest]
    fn honours_custom_templates(graph: PartitionedGraph) {
        let (_guard, root) = workspace();
        JsonPartitionSink::new(&root)
            .with_template("cell_{lat}_{lon}.geo.json")
            .expect("valid template")
            .persist(&graph)
            .expect("persist");
        assert!(root.join("cell_1.000_1.000.geo.json").is_file());
    }

    #[rstest]
    fn rewrites_remove_partitions_from_earlier_runs(graph: PartitionedGraph) {
        let (_guard, root) = workspace();
        JsonPartitionSink::new(&root).persist(&graph).expect("first run");
        assert!(root.join("-0.500_2.250.json").is_file());
        fs::write(root.join("notes.json"), b"{}").expect("write unrelated file");
        fs::write(root.join("1.000_1.000.csv"), b"id").expect("write other extension");

        let mut edges = AdjacencyGraph::default();
        edges.add_edge("A", "B");
        let points = [Point::new("A", 1.0, 1.0), Point::new("B", 1.0, 1.0001)];
        let smaller = aggregate(&points, &edges, &PartitionAssigner::default());
        JsonPartitionSink::new(&root).persist(&smaller).expect("second run");

        assert!(!root.join("-0.500_2.250.json").exists(), "stale partition kept");
        assert!(root.join("1.000_1.000.json").is_file());
        assert!(root.join(PARTITION_MAP_FILE).is_file());
        assert!(root.join("notes.json").is_file());
        assert!(root.join("1.000_1.000.csv").is_file());
        assert_eq!(
            read_json(&root.join(PARTITION_MAP_FILE)),
            json!({
                "A": {"lat": "1.000", "lon": "1.000"},
                "B": {"lat": "1.000", "lon": "1.000"},
            })
        );
    }

    #[rstest]
    #[case("{lat}_{lon}.json", "-0.500_2.250.json", true)]
    #[case("{lat}_{lon}.json", "12_-3.json", true)]
    #[case("{lat}_{lon}.json", "partitions.json", false)]
    #[case("{lat}_{lon}.json", "notes_1.json", false)]
    #[case("{lat}_{lon}.json", "1.000_1.000.json.bak", false)]
    #[case("cell_{lon}{lat}.geo.json", "cell_2.250-0.500.geo.json", true)]
    #[case("cell_{lon}{lat}.geo.json", "cell_.geo.json", false)]
    fn recognises_template_file_names(
        #[case] template: &str,
        #[case] name: &str,
        #[case] expected: bool,
    ) {
        let sink = JsonPartitionSink::new("out")
            .with_template(template)
            .expect("valid template");
        assert_eq!(sink.matches_template(name), expected);
    }

    #[rstest]
    #[case("{lat}.json")]
    #[case("{lon}.json")]
    #[case("nested/{lat}_{lon}.json")]
    fn rejects_ambiguous_templates(#[case] template: &str) {
        let err = JsonPartitionSink::new("out")
            .with_template(template)
            .expect_err("template should be rejected");
        assert!(matches!(err, WriteJsonError::InvalidTemplate { .. }));
    }
}
