use datafetch_core::logging;
use std::process::ExitCode;

mod cli;

use crate::cli::{error_label, CliCommand};

#[tokio::main]
async fn main() -> ExitCode {
    // Log to the state dir; fall back to stderr if it is unwritable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    match CliCommand::run_from_args().await {
        Ok(code) => code,
        Err(err) => {
            match error_label(&err) {
                Some(kind) => eprintln!("datafetch error ({}): {:#}", kind, err),
                None => eprintln!("datafetch error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
