//! Command line and failure reporting for the binary

use clap::Parser;
use std::process::ExitCode;
use tracing::error;
use wakeguard_core::APP_TITLE;
use wakeguard_host_api::{MessageLevel, StatusSurface};

/// wakeguard - screensaver suppression
#[derive(Parser, Debug)]
#[command(name = "wakeguard", version)]
#[command(about = "Keeps the screensaver and display sleep away while it runs", long_about = None)]
pub struct Args {
    /// Interval in seconds (10..3600) for synthetic input, or /s, /p, /c
    #[arg(allow_negative_numbers = true)]
    pub tokens: Vec<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

/// Show `error` as a modal message and pick the failure exit code
pub async fn report_failure(surface: &dyn StatusSurface, error: &anyhow::Error) -> ExitCode {
    error!(error = %format!("{:#}", error), "wakeguard cannot continue");
    surface
        .message(MessageLevel::Error, APP_TITLE, &format!("{:#}", error))
        .await;
    ExitCode::FAILURE
}
