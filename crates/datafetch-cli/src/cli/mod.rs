//! CLI for datafetch.

pub(crate) mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use datafetch_core::{config, Error};
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{run_checksum, run_config, run_exists, run_extract, run_fetch, run_remove};

/// Top-level CLI for datafetch.
#[derive(Debug, Parser)]
#[command(name = "datafetch")]
#[command(about = "Fetch, verify and unpack remote datasets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a resource from the dataset server (or any http/https URL).
    Fetch(FetchArgs),

    /// Unpack a .tar.gz or .tar archive.
    Extract {
        /// Path to the archive.
        archive: PathBuf,
        /// Directory to unpack into (default: the archive's directory).
        #[arg(long, value_name = "DIR")]
        to: Option<PathBuf>,
    },

    /// Compute a file checksum, or compare it against an expected value.
    Checksum {
        /// Path to the file.
        path: PathBuf,
        /// Expected hex digest; exits non-zero on mismatch.
        #[arg(long, value_name = "HEX")]
        expect: Option<String>,
        /// Use SHA-256 instead of CRC-32.
        #[arg(long)]
        sha256: bool,
    },

    /// Exit 0 if the path exists, 1 otherwise.
    Exists {
        path: PathBuf,
    },

    /// Remove a file or empty directory. Missing paths are not an error.
    Remove {
        path: PathBuf,
    },

    /// Show the config file location and effective settings.
    Config,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Path on the server (e.g. /datasets/iris.csv) or an absolute URL.
    pub path: String,

    /// Destination file (default: last path segment in the current directory).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Override the configured server (host name or base URL).
    #[arg(long)]
    pub server: Option<String>,

    /// Use https for a bare host name.
    #[arg(long)]
    pub https: bool,

    /// Bearer token sent with the request.
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Fail if the destination already exists.
    #[arg(long)]
    pub no_overwrite: bool,

    /// Unpack the downloaded archive next to it.
    #[arg(long)]
    pub extract: bool,

    /// Unpack the downloaded archive into DIR (implies --extract).
    #[arg(long, value_name = "DIR")]
    pub extract_to: Option<PathBuf>,

    /// Expected CRC-32 of the downloaded file (8 hex digits).
    #[arg(long, value_name = "HEX")]
    pub crc32: Option<String>,

    /// Total attempts for transient failures (overrides config).
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,
}

impl CliCommand {
    /// Runs the parsed command. `Ok` carries the exit status for commands
    /// that answer a question (`exists`).
    pub async fn run_from_args() -> Result<ExitCode> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch(args) => run_fetch(cfg, args).await?,
            CliCommand::Extract { archive, to } => run_extract(&archive, to.as_deref()).await?,
            CliCommand::Checksum {
                path,
                expect,
                sha256,
            } => run_checksum(&path, expect.as_deref(), sha256).await?,
            CliCommand::Exists { path } => {
                if !run_exists(&path).await {
                    return Ok(ExitCode::FAILURE);
                }
            }
            CliCommand::Remove { path } => run_remove(&path).await?,
            CliCommand::Config => run_config(&cfg).await?,
        }

        Ok(ExitCode::SUCCESS)
    }
}

/// Stage label (`fetch`, `extract`, `not-found`, `io`) of a library error anywhere in `err`'s chain.
pub fn error_label(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|e| e.downcast_ref::<Error>())
        .map(Error::kind_str)
}

#[cfg(test)]
mod tests;
