//! `datafetch checksum` – print or verify a file digest.

use anyhow::{bail, Result};
use datafetch_core::checksum::{self, ChecksumAlgorithm, ChecksumOutcome};
use std::path::Path;

pub async fn run_checksum(path: &Path, expect: Option<&str>, sha256: bool) -> Result<()> {
    let algorithm = if sha256 {
        ChecksumAlgorithm::Sha256
    } else {
        ChecksumAlgorithm::Crc32
    };

    let Some(expected) = expect else {
        let digest = checksum::digest_path(path, algorithm)?;
        println!("{}  {}", digest, path.display());
        return Ok(());
    };

    match checksum::compare_checksum(path, algorithm, expected) {
        ChecksumOutcome::Match => {
            println!("{}: OK", path.display());
            Ok(())
        }
        ChecksumOutcome::Mismatch(record) => bail!(
            "{} mismatch for {}: expected {}, computed {}",
            record.algorithm,
            path.display(),
            record.expected,
            record.computed
        ),
        ChecksumOutcome::SourceUnavailable(e) => Err(e.into()),
    }
}
