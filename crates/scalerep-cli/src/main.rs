use scalerep_core::logging;
use std::process::ExitCode;

mod cli;

use crate::cli::Cli;

fn main() -> ExitCode {
    // Initialize logging as early as possible; console only if the log file is unavailable.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("log file unavailable, logging to console only: {:#}", err);
    }

    match Cli::run_from_args() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("scalerep error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
