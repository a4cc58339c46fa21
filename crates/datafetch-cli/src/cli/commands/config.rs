//! `datafetch config` – show where the config lives and what is in effect.

use anyhow::Result;
use datafetch_core::config::{self, FetchConfig};

pub async fn run_config(cfg: &FetchConfig) -> Result<()> {
    println!("config: {}", config::config_path()?.display());
    println!("server: {}", cfg.server);
    println!("use_encrypted_transport: {}", cfg.use_encrypted_transport);
    println!("overwrite_existing: {}", cfg.overwrite_existing);
    println!(
        "timeouts: connect {}s, total {}s",
        cfg.transport.connect_timeout_secs, cfg.transport.timeout_secs
    );
    match &cfg.retry {
        Some(r) => println!(
            "retry: {} attempts, base {}s, max {}s",
            r.max_attempts, r.base_delay_secs, r.max_delay_secs
        ),
        None => println!("retry: single attempt"),
    }
    Ok(())
}
