use crate::location::ResourceLocation;
use crate::retry::RetryPolicy;
use crate::transport::TransportOptions;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Dataset mirror used when a caller supplies only a relative resource path.
pub const DEFAULT_SERVER: &str = "www.mlpack.org";

/// Caller-side retry parameters (optional section in config.toml).
/// `fetch` itself never retries; the CLI applies this around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/datafetch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base server for relative resource paths: a host name, or a base URL with scheme.
    pub server: String,
    /// Use https for bare host names.
    #[serde(default)]
    pub use_encrypted_transport: bool,
    /// Default for requests built from this config.
    #[serde(default = "default_true")]
    pub overwrite_existing: bool,
    #[serde(default)]
    pub transport: TransportOptions,
    /// Optional retry policy; if missing, callers make a single attempt.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_true() -> bool {
    true
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            use_encrypted_transport: false,
            overwrite_existing: true,
            transport: TransportOptions::default(),
            retry: None,
        }
    }
}

impl FetchConfig {
    /// Location of `relative_path` on the configured server.
    pub fn location(&self, relative_path: impl Into<String>) -> ResourceLocation {
        ResourceLocation::new(self.server.clone(), relative_path)
            .with_encrypted_transport(self.use_encrypted_transport)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("datafetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
