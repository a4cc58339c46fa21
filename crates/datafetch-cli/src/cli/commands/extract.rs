//! `datafetch extract` – unpack an archive that is already on disk.

use anyhow::Result;
use datafetch_core::{archive, Error};
use std::path::Path;

pub async fn run_extract(archive_path: &Path, to: Option<&Path>) -> Result<()> {
    let target = match to {
        Some(dir) => dir.to_path_buf(),
        None => default_target(archive_path),
    };
    let result = archive::extract(archive_path, &target).map_err(Error::from)?;
    for path in result.paths() {
        println!("{}", path.display());
    }
    Ok(())
}

fn default_target(archive_path: &Path) -> std::path::PathBuf {
    match archive_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    }
}
