//! Capability-based UTF-8 filesystem helpers shared by the osmgrid crates.
//!
//! Paths arrive as `camino` UTF-8 paths from configuration. Every helper
//! resolves them against an ambient root (`/`, a Windows prefix or `.`) once
//! and then works through a `cap-std` directory handle.
#![forbid(unsafe_code)]

use std::io;
use std::path::Component;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Open a file for reading.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Create `path` and any missing ancestors, then open it.
pub fn create_dir_all(path: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    let (root, relative) = split_ambient(path)?;
    if relative.as_str().is_empty() {
        return Ok(root);
    }
    root.create_dir_all(&relative)?;
    root.open_dir(&relative)
}

/// Create the parent directory of a file path when it is missing.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => create_dir_all(parent).map(drop),
        _ => Ok(()),
    }
}

/// Whether `path` exists and is a regular file.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = parent_and_name(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Open the directory containing `path` and return it with the file name.
pub fn parent_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

/// Split a path into an ambient root directory and the remainder below it.
pub fn split_ambient(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();
    let base = match std_path.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            Utf8PathBuf::from(prefix).join(std::path::MAIN_SEPARATOR.to_string())
        }
        Some(Component::RootDir) => Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string()),
        _ => Utf8PathBuf::from("."),
    };
    let relative = if base.as_str() == "." {
        path.to_path_buf()
    } else {
        path.strip_prefix(&base)
            .map_err(|_| io::Error::other(format!("failed to strip {base} from {path}")))?
            .to_path_buf()
    };
    let root = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    Ok((root, relative))
}
