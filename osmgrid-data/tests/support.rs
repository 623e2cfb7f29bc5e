use camino::Utf8PathBuf;

/// Directory containing the XML fixtures.
pub fn fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Path of a named fixture, asserting that it exists.
pub fn fixture(name: &str) -> Utf8PathBuf {
    let path = fixtures_dir().join(name);
    assert!(path.is_file(), "missing fixture {path}");
    path
}
