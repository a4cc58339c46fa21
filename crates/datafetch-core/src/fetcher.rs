//! Fetch Orchestrator: the single entry point pipelines call.
//!
//! `download_file` runs transport then, if requested, extraction, and
//! forwards the first failure unchanged. Checksum verification is never
//! chained here; callers run it as a separate step after a fetch.

use crate::archive::{self, ExtractionResult};
use crate::cancel::CancelToken;
use crate::config::FetchConfig;
use crate::error::{Error, FetchError};
use crate::location::ResourceLocation;
use crate::request::{FetchRequest, LocalFile};
use crate::transport::{self, CurlTransport, Transport};
use std::path::{Path, PathBuf};

/// Result of `download_file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file: LocalFile,
    /// Present when the request asked for extraction.
    pub extracted: Option<ExtractionResult>,
}

pub struct Fetcher {
    config: FetchConfig,
    transport: Box<dyn Transport>,
}

impl Fetcher {
    /// Fetcher over libcurl with the config's transport limits.
    pub fn new(config: FetchConfig) -> Self {
        let transport = CurlTransport::new(config.transport.clone());
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: FetchConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// `relative_path` on the configured default server.
    pub fn location(&self, relative_path: impl Into<String>) -> ResourceLocation {
        self.config.location(relative_path)
    }

    /// Request for `relative_path` on the default server, with the configured overwrite default.
    pub fn request(&self, relative_path: impl Into<String>, destination: impl Into<PathBuf>) -> FetchRequest {
        FetchRequest::new(self.location(relative_path), destination)
            .overwrite_existing(self.config.overwrite_existing)
    }

    /// Transport only: materialize the remote file at `request.destination`.
    pub fn fetch(&self, request: &FetchRequest, cancel: Option<&CancelToken>) -> Result<LocalFile, FetchError> {
        transport::fetch(request, self.transport.as_ref(), cancel)
    }

    /// Unpack an already fetched archive. Composable with `fetch` in caller code.
    pub fn extract(&self, archive: &Path, target_dir: &Path) -> Result<ExtractionResult, Error> {
        Ok(archive::extract(archive, target_dir)?)
    }

    /// Fetch, then extract when `request.extract_archive` is set.
    pub fn download_file(&self, request: &FetchRequest, cancel: Option<&CancelToken>) -> Result<Download, Error> {
        let file = self.fetch(request, cancel)?;
        let extracted = if request.extract_archive {
            let target = request.extraction_dir();
            Some(self.extract(&file.path, &target)?)
        } else {
            None
        };
        Ok(Download { file, extracted })
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(FetchConfig::default())
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").field("config", &self.config).finish_non_exhaustive()
    }
}
