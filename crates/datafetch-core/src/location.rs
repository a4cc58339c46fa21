//! Composition of a remote address from a base server and a relative path.

use crate::error::{FetchError, FetchErrorKind};
use url::Url;

/// Where a remote file lives. Immutable once built for a fetch.
///
/// `server` is either a bare host (`www.mlpack.org`), optionally with a path
/// prefix, or a full base with scheme (`https://raw.githubusercontent.com/mlpack/`).
/// An explicit scheme decides the transport; otherwise `use_encrypted_transport` does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    server: String,
    relative_path: String,
    use_encrypted_transport: bool,
}

impl ResourceLocation {
    pub fn new(server: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            relative_path: relative_path.into(),
            use_encrypted_transport: false,
        }
    }

    pub fn with_encrypted_transport(mut self, encrypted: bool) -> Self {
        self.use_encrypted_transport = encrypted;
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn use_encrypted_transport(&self) -> bool {
        self.use_encrypted_transport
    }

    /// Unresolved `server` + `relative_path`, for diagnostics when resolution fails.
    pub fn display_address(&self) -> String {
        format!("{}{}", self.server, self.relative_path)
    }

    /// Builds the absolute address: exactly one `/` between server and path.
    ///
    /// A relative path that is itself an absolute http(s) URL is used as-is.
    pub fn resolve(&self) -> Result<Url, FetchError> {
        let invalid = || FetchError::new(FetchErrorKind::InvalidAddress, self.display_address());

        let path = self.relative_path.trim();
        if split_scheme(path).is_some() {
            return parse_http_url(path).ok_or_else(invalid);
        }

        let server = self.server.trim();
        let (scheme, base) = match split_scheme(server) {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None if self.use_encrypted_transport => ("https".to_string(), server),
            None => ("http".to_string(), server),
        };
        let base = base.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if base.is_empty() || path.is_empty() {
            return Err(invalid());
        }

        let joined = format!("{}://{}/{}", scheme, base, path);
        parse_http_url(&joined).ok_or_else(invalid)
    }

    /// Whether the resolved address uses TLS.
    pub fn is_encrypted(&self) -> bool {
        self.resolve()
            .map(|u| u.scheme() == "https")
            .unwrap_or(self.use_encrypted_transport)
    }
}

fn split_scheme(s: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = s.split_once("://")?;
    let valid = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.');
    valid.then_some((scheme, rest))
}

fn parse_http_url(s: &str) -> Option<Url> {
    let url = Url::parse(s).ok()?;
    let http = matches!(url.scheme(), "http" | "https");
    (http && url.host().is_some()).then_some(url)
}
