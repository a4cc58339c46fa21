//! Existence checks and removal of local paths.
//!
//! Neither operation raises: ambiguity (permission denied, broken parent)
//! is folded into "not there".

use std::fs;
use std::io;
use std::path::Path;

/// Whether a file or directory is present at `path`. Inaccessible paths count as absent.
pub fn path_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().try_exists().unwrap_or(false)
}

/// Removes the file (or empty directory) at `path`.
/// Returns `Ok(true)` if something was removed, `Ok(false)` if nothing was there.
pub fn try_remove_file(path: impl AsRef<Path>) -> io::Result<bool> {
    let path = path.as_ref();
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    let removed = if meta.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };
    match removed {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Removes the file at `path` if present. Idempotent; failures are logged, not raised.
pub fn remove_file(path: impl AsRef<Path>) {
    let path = path.as_ref();
    match try_remove_file(path) {
        Ok(true) => tracing::debug!(path = %path.display(), "removed"),
        Ok(false) => {}
        Err(e) => tracing::warn!(path = %path.display(), "could not remove: {}", e),
    }
}
