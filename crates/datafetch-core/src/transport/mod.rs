//! Transport Resolver: resolve the remote address, stream the body to the
//! destination, and leave nothing behind on failure.
//!
//! The network stack sits behind the `Transport` trait; `CurlTransport` is
//! the production implementation. `fetch` makes exactly one attempt.

mod classify;
mod easy;

pub use easy::CurlTransport;

use crate::cancel::CancelToken;
use crate::error::{FetchError, FetchErrorKind};
use crate::probe;
use crate::request::{FetchRequest, LocalFile};
use crate::storage::PartFile;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;
use url::Url;

/// Transfer limits (optional `[transport]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportOptions {
    /// Seconds allowed for the TCP/TLS connect phase.
    pub connect_timeout_secs: u64,
    /// Hard wall-clock limit for the whole transfer.
    pub timeout_secs: u64,
    /// Abort if throughput stays below this many bytes/s ...
    pub low_speed_limit_bytes: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    pub max_redirections: u32,
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 3600,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
            max_redirections: 10,
            user_agent: concat!("datafetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TransportOptions {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn low_speed_time(&self) -> Duration {
        Duration::from_secs(self.low_speed_time_secs)
    }
}

/// What a completed transfer reported. The body has been written to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    /// Final HTTP status after redirects.
    pub status: u32,
    pub bytes: u64,
}

/// Narrow interface to the network stack.
///
/// Implementations stream the response body for `url` into `sink`, sending
/// `headers` verbatim, and stop with `FetchErrorKind::Cancelled` once `cancel`
/// is set. Status interpretation is left to the caller.
pub trait Transport: Send + Sync {
    fn transfer(
        &self,
        url: &Url,
        headers: &[(String, String)],
        sink: &mut dyn Write,
        cancel: Option<&CancelToken>,
    ) -> Result<TransferReport, FetchError>;
}

/// Materializes `request.location` at `request.destination`.
///
/// Single attempt. On any failure the `.part` file is removed and an existing
/// destination is left untouched. With `overwrite_existing == false` an
/// existing destination fails fast with `DestinationExists` before any traffic.
pub fn fetch(
    request: &FetchRequest,
    transport: &dyn Transport,
    cancel: Option<&CancelToken>,
) -> Result<LocalFile, FetchError> {
    let url = request.location.resolve()?;
    let remote = url.as_str();
    let destination = &request.destination;

    if !request.overwrite_existing && probe::path_exists(destination) {
        return Err(FetchError::new(FetchErrorKind::DestinationExists, remote));
    }
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(FetchError::new(FetchErrorKind::Cancelled, remote));
    }

    let mut headers = Vec::new();
    if let Some(token) = &request.auth_token {
        headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
    }

    let mut part = PartFile::create(destination)
        .map_err(|e| FetchError::new(FetchErrorKind::Io, remote).with_source(e))?;
    tracing::debug!(
        url = %remote,
        dest = %destination.display(),
        encrypted = url.scheme() == "https",
        "fetch start"
    );

    let report = transport.transfer(&url, &headers, &mut part, cancel)?;
    if !(200..300).contains(&report.status) {
        return Err(FetchError::new(FetchErrorKind::HttpStatus(report.status), remote));
    }
    if part.written() == 0 {
        return Err(FetchError::new(FetchErrorKind::EmptyBody, remote));
    }

    let size = part
        .finalize()
        .map_err(|e| FetchError::new(FetchErrorKind::Io, remote).with_source(e))?;
    tracing::info!(url = %remote, dest = %destination.display(), bytes = size, "fetched");
    Ok(LocalFile {
        path: destination.clone(),
        size,
    })
}
