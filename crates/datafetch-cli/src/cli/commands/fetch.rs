//! `datafetch fetch` – download, optionally verify and unpack.

use anyhow::{bail, Context, Result};
use datafetch_core::checksum::{self, ChecksumOutcome};
use datafetch_core::config::FetchConfig;
use datafetch_core::probe;
use datafetch_core::retry::{run_with_retry, RetryPolicy};
use datafetch_core::{CancelToken, Error, Fetcher};
use std::path::{Path, PathBuf};

use crate::cli::FetchArgs;

pub async fn run_fetch(mut cfg: FetchConfig, args: FetchArgs) -> Result<()> {
    if let Some(server) = &args.server {
        cfg.server = server.clone();
    }
    if args.https {
        cfg.use_encrypted_transport = true;
    }
    let policy = retry_policy(&cfg, args.retries);
    let destination = match &args.output {
        Some(p) => p.clone(),
        None => default_destination(&args.path)?,
    };

    let fetcher = Fetcher::new(cfg);
    let mut request = fetcher.request(args.path.as_str(), &destination);
    if let Some(token) = &args.token {
        request = request.auth_token(token.as_str());
    }
    if args.no_overwrite {
        request = request.overwrite_existing(false);
    }
    if let Some(dir) = &args.extract_to {
        request = request.extract_to(dir);
    } else if args.extract {
        request = request.extract_archive(true);
    }
    tracing::debug!(?request, ?policy, "fetch");

    let cancel = CancelToken::new();
    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling transfer");
                cancel.cancel();
            }
        }
    });

    let expected_crc = args.crc32.clone();
    let outcome = tokio::task::spawn_blocking(move || -> Result<()> {
        let file = run_with_retry(&policy, || fetcher.fetch(&request, Some(&cancel)))
            .map_err(Error::from)?;
        println!("Fetched {} ({} bytes)", file.path.display(), file.size);

        if let Some(expected) = expected_crc {
            verify(&file.path, &expected)?;
        }
        if request.extract_archive {
            let extracted = fetcher.extract(&file.path, &request.extraction_dir())?;
            for path in extracted.paths() {
                println!("  {}", path.display());
            }
        }
        Ok(())
    })
    .await
    .context("fetch task join");
    ctrl_c.abort();
    outcome?
}

fn retry_policy(cfg: &FetchConfig, retries: Option<u32>) -> RetryPolicy {
    let base = cfg
        .retry
        .as_ref()
        .map(|r| r.policy())
        .unwrap_or_else(RetryPolicy::single_attempt);
    match retries {
        Some(n) => RetryPolicy {
            max_attempts: n.max(1),
            ..base
        },
        None => base,
    }
}

/// A mismatching download is removed so a rerun starts clean.
fn verify(path: &Path, expected: &str) -> Result<()> {
    match checksum::compare_crc32(path, expected) {
        ChecksumOutcome::Match => {
            println!("CRC-32 OK");
            Ok(())
        }
        ChecksumOutcome::Mismatch(record) => {
            probe::remove_file(path);
            bail!(
                "CRC-32 mismatch for {}: expected {}, computed {}",
                path.display(),
                record.expected,
                record.computed
            )
        }
        ChecksumOutcome::SourceUnavailable(e) => Err(e.into()),
    }
}

/// Last non-empty segment of the resource path, in the current directory.
pub(crate) fn default_destination(resource: &str) -> Result<PathBuf> {
    let without_query = resource.split(['?', '#']).next().unwrap_or_default();
    match without_query.rsplit('/').find(|s| !s.is_empty()) {
        Some(name) if !name.contains("://") && !name.ends_with(':') => Ok(PathBuf::from(name)),
        _ => bail!("cannot derive a file name from {:?}; pass --output", resource),
    }
}
