//! Typed failures for every public operation.
//!
//! Each error carries a machine-readable kind plus the offending path or
//! remote address, so callers can assert on structure rather than on text.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A referenced local path does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not found: {}", .path.display())]
pub struct NotFoundError {
    pub path: PathBuf,
}

impl NotFoundError {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// What went wrong while materializing a remote resource locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Server and relative path do not compose into an absolute http(s) address.
    InvalidAddress,
    /// Destination exists and the request did not allow overwriting it.
    DestinationExists,
    /// DNS (or proxy) resolution failed.
    Resolve,
    /// TCP connection could not be established.
    Connect,
    /// TLS handshake or certificate verification failed.
    Tls,
    /// Connect, low-speed or overall timeout expired.
    Timeout,
    /// Server answered with a non-2xx status.
    HttpStatus(u32),
    /// Stream ended early or the connection dropped mid-body.
    Interrupted,
    /// Server answered 2xx with no body.
    EmptyBody,
    /// Caller cancelled the transfer.
    Cancelled,
    /// Local filesystem failure while writing the destination.
    Io,
    Other,
}

impl FetchErrorKind {
    /// Whether a later identical attempt has a reasonable chance to succeed.
    pub fn is_transient(self) -> bool {
        match self {
            FetchErrorKind::Resolve
            | FetchErrorKind::Connect
            | FetchErrorKind::Timeout
            | FetchErrorKind::Interrupted => true,
            FetchErrorKind::HttpStatus(code) => code == 429 || (500..=599).contains(&code),
            _ => false,
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::InvalidAddress => write!(f, "invalid remote address"),
            FetchErrorKind::DestinationExists => {
                write!(f, "destination exists and overwriting is disabled")
            }
            FetchErrorKind::Resolve => write!(f, "could not resolve host"),
            FetchErrorKind::Connect => write!(f, "could not connect"),
            FetchErrorKind::Tls => write!(f, "TLS failure"),
            FetchErrorKind::Timeout => write!(f, "timed out"),
            FetchErrorKind::HttpStatus(code) => write!(f, "HTTP {}", code),
            FetchErrorKind::Interrupted => write!(f, "transfer interrupted"),
            FetchErrorKind::EmptyBody => write!(f, "empty response body"),
            FetchErrorKind::Cancelled => write!(f, "cancelled"),
            FetchErrorKind::Io => write!(f, "local I/O error"),
            FetchErrorKind::Other => write!(f, "transfer failed"),
        }
    }
}

/// Transport-layer failure for one remote address.
#[derive(Debug, thiserror::Error)]
#[error("fetch {remote_address}: {kind}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub remote_address: String,
    #[source]
    source: Option<BoxError>,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, remote_address: impl Into<String>) -> Self {
        Self {
            kind,
            remote_address: remote_address.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }
}

/// Why an archive could not be unpacked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractErrorKind {
    /// The archive file itself is missing.
    NotFound,
    /// Container signature recognized, but the compression is not supported.
    UnsupportedCompression(&'static str),
    /// Leading bytes match no known container.
    UnrecognizedFormat,
    /// Stream ended before the archive was complete.
    Truncated,
    /// Corrupt compressed stream or tar structure.
    Malformed,
    /// A member (or link target) would resolve outside the target directory.
    PathTraversal(PathBuf),
    /// Local filesystem failure while writing members.
    Io,
}

impl fmt::Display for ExtractErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractErrorKind::NotFound => write!(f, "archive not found"),
            ExtractErrorKind::UnsupportedCompression(name) => {
                write!(f, "unsupported compression: {}", name)
            }
            ExtractErrorKind::UnrecognizedFormat => write!(f, "unrecognized archive format"),
            ExtractErrorKind::Truncated => write!(f, "archive is truncated"),
            ExtractErrorKind::Malformed => write!(f, "archive is malformed"),
            ExtractErrorKind::PathTraversal(member) => {
                write!(f, "member escapes target directory: {}", member.display())
            }
            ExtractErrorKind::Io => write!(f, "local I/O error"),
        }
    }
}

/// Archive unpacking failure.
#[derive(Debug, thiserror::Error)]
#[error("extract {}: {kind}", .archive.display())]
pub struct ExtractError {
    pub kind: ExtractErrorKind,
    pub archive: PathBuf,
    #[source]
    source: Option<BoxError>,
}

impl ExtractError {
    pub fn new(kind: ExtractErrorKind, archive: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            archive: archive.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Maps an I/O error raised while decoding or writing to a kind.
    pub(crate) fn from_io(archive: &Path, err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::UnexpectedEof => ExtractErrorKind::Truncated,
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::Other => {
                ExtractErrorKind::Malformed
            }
            _ => ExtractErrorKind::Io,
        };
        Self::new(kind, archive).with_source(err)
    }

    pub fn kind(&self) -> &ExtractErrorKind {
        &self.kind
    }
}

/// Crate-level error: the first failure of any pipeline stage, forwarded unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Reads `path`'s I/O error into `NotFound` when the file is missing.
    pub(crate) fn from_read(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound(NotFoundError::new(path))
        } else {
            Error::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Short stable label for diagnostics (`not-found`, `fetch`, `extract`, `io`).
    pub fn kind_str(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not-found",
            Error::Fetch(_) => "fetch",
            Error::Extract(_) => "extract",
            Error::Io { .. } => "io",
        }
    }
}
