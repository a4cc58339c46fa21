//! Per-call fetch request and its result.

use crate::location::ResourceLocation;
use std::fmt;
use std::path::{Path, PathBuf};

/// One fetch: where from, where to, and what to do with the result.
/// Built per call and discarded when the call returns.
#[derive(Clone)]
pub struct FetchRequest {
    pub location: ResourceLocation,
    pub destination: PathBuf,
    /// Opaque credential, sent as a bearer token.
    pub auth_token: Option<String>,
    pub overwrite_existing: bool,
    pub extract_archive: bool,
    /// Defaults to the destination's parent directory.
    pub extraction_target_dir: Option<PathBuf>,
}

impl FetchRequest {
    pub fn new(location: ResourceLocation, destination: impl Into<PathBuf>) -> Self {
        Self {
            location,
            destination: destination.into(),
            auth_token: None,
            overwrite_existing: true,
            extract_archive: false,
            extraction_target_dir: None,
        }
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn overwrite_existing(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }

    pub fn extract_archive(mut self, extract: bool) -> Self {
        self.extract_archive = extract;
        self
    }

    /// Enables extraction into `dir`.
    pub fn extract_to(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extract_archive = true;
        self.extraction_target_dir = Some(dir.into());
        self
    }

    /// Directory extraction writes into: explicit target, else the destination's parent.
    pub fn extraction_dir(&self) -> PathBuf {
        if let Some(dir) = &self.extraction_target_dir {
            return dir.clone();
        }
        match self.destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("location", &self.location)
            .field("destination", &self.destination)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("overwrite_existing", &self.overwrite_existing)
            .field("extract_archive", &self.extract_archive)
            .field("extraction_target_dir", &self.extraction_target_dir)
            .finish()
    }
}

/// A fetched file on durable storage. Exists and is non-empty when returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub size: u64,
}

impl LocalFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}
