//! `datafetch exists` – exit status reports whether a path exists.

use datafetch_core::probe;
use std::path::Path;

/// Prints the path and returns `true` when it exists.
pub async fn run_exists(path: &Path) -> bool {
    let exists = probe::path_exists(path);
    if exists {
        println!("{}", path.display());
    }
    exists
}
