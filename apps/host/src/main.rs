//! # posbridge Host Entry Point
//!
//! The setup lives in lib.rs for testability.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match posbridge_host::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "posbridge host failed");
            eprintln!("posbridge-host: {}", e);
            ExitCode::FAILURE
        }
    }
}
