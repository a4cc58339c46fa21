//! `datafetch remove` – delete a fetched file.

use anyhow::{Context, Result};
use datafetch_core::probe;
use std::path::Path;

pub async fn run_remove(path: &Path) -> Result<()> {
    let removed = probe::try_remove_file(path)
        .with_context(|| format!("remove {}", path.display()))?;
    if removed {
        println!("Removed {}", path.display());
    } else {
        println!("{} not present", path.display());
    }
    Ok(())
}
