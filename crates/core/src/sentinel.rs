//! Writing-in-progress sentinel convention.
//!
//! A long artifact write is bracketed by a marker file: the marker is
//! created immediately before the write begins and removed only once the
//! write fully completes. A reader treats the artifact as finished only
//! when the artifact exists *and* the marker does not, so a partially
//! written artifact is never observed as done.
//!
//! The sentinel is a single-writer signal for readers, not a mutual
//! exclusion primitive; concurrent writers to the same artifact are
//! unspecified.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix appended to the artifact path to form the marker path.
const MARKER_SUFFIX: &str = ".writing";

/// Marker path for a given artifact.
pub fn marker_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_os_string();
    name.push(MARKER_SUFFIX);
    PathBuf::from(name)
}

/// Guard representing an in-progress write of `artifact`.
///
/// Created by [`begin_write`]. Call [`commit`](WriteGuard::commit) once the
/// artifact is fully written; dropping the guard without committing leaves
/// the marker in place, so readers keep reporting not-done.
#[derive(Debug)]
pub struct WriteGuard {
    marker: PathBuf,
}

impl WriteGuard {
    /// Remove the marker, signalling that the write fully completed.
    pub fn commit(self) -> io::Result<()> {
        fs::remove_file(&self.marker)
    }
}

/// Create the writing marker for `artifact`.
///
/// Must be called before the first byte of the artifact is written.
pub fn begin_write(artifact: &Path) -> io::Result<WriteGuard> {
    let marker = marker_path(artifact);
    if let Some(parent) = marker.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&marker, b"")?;
    Ok(WriteGuard { marker })
}

/// Whether `artifact` is fully written: present, with no marker.
pub fn is_complete(artifact: &Path) -> bool {
    artifact.exists() && !marker_path(artifact).exists()
}
