//! CLI command handlers, one per file.

mod checksum;
mod config;
mod exists;
mod extract;
mod fetch;
mod remove;

pub use checksum::run_checksum;
pub use config::run_config;
pub use exists::run_exists;
pub use extract::run_extract;
pub use fetch::run_fetch;
pub use remove::run_remove;
