//! Opening plain and bzip2-compressed OSM XML files.

use std::io::{BufRead, BufReader};

use bzip2::read::MultiBzDecoder;
use camino::Utf8Path;
use osmgrid_fs::open_utf8_file;

use super::OsmIngestError;

/// Buffered byte source shared with the pipelined worker thread.
pub type XmlSource = Box<dyn BufRead + Send>;

/// Whether the path names a bzip2 archive, ignoring extension case.
#[must_use]
pub fn is_bz2(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("bz2"))
}

/// Open `path` for streaming, decompressing `.bz2` files on the fly.
pub fn open_xml_source(path: &Utf8Path) -> Result<XmlSource, OsmIngestError> {
    let file = open_utf8_file(path).map_err(|source| OsmIngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if is_bz2(path) {
        Ok(Box::new(BufReader::new(MultiBzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
