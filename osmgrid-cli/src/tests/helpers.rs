//! Test helpers for writing OSM XML extracts to temporary directories.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

pub(super) const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="A" lat="1.0" lon="1.0"/>
  <node id="B" lat="1.0" lon="1.0001"/>
  <node id="C" lat="3.0" lon="3.0"/>
  <way id="1">
    <nd ref="A"/><nd ref="B"/><nd ref="C"/>
    <tag k="highway" v="residential"/>
  </way>
  <way id="2">
    <nd ref="A"/><nd ref="B"/>
    <tag k="building" v="yes"/>
  </way>
</osm>
"#;

/// A temporary directory holding `extract.osm`.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
    extract: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        let extract = root.join("extract.osm");
        fs::write(&extract, SAMPLE_XML).expect("write extract");
        Self {
            _dir: dir,
            root,
            extract,
        }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn extract(&self) -> &Utf8Path {
        &self.extract
    }
}
