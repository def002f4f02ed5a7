use std::process::ExitCode;

use objmeta_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to the state dir; fall back to stderr rather than refusing to run.
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("log file unavailable, logging to stderr: {:#}", e);
    }

    match CliCommand::run_from_args().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("objmeta error: {:#}", err);
            ExitCode::from(1)
        }
    }
}
