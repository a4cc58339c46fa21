//! Path-traversal guard for archive members and link targets.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Normalizes a member name to a path relative to the target directory.
///
/// `.` components are dropped. Absolute paths, drive prefixes and `..`
/// anywhere are rejected with `None`. The result may be empty (e.g. `./`).
pub(super) fn sanitize(raw: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

/// Whether a symlink at `member` pointing to `target` stays inside the target directory.
pub(super) fn symlink_stays_inside(member: &Path, target: &Path) -> bool {
    let mut depth: Vec<&std::ffi::OsStr> = member
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    for component in target.components() {
        match component {
            Component::Normal(part) => depth.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth.pop().is_none() {
                    return false;
                }
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Whether any parent of `relative` is one of the symlinks in `links`.
pub(super) fn passes_through(relative: &Path, links: &HashSet<PathBuf>) -> bool {
    !links.is_empty() && relative.ancestors().skip(1).any(|a| links.contains(a))
}
