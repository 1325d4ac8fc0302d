//! wakeguard - keeps the screensaver away while it runs
//!
//! This is the main entry point. It wires together:
//! - Launch token validation
//! - The instance lock and duplicate-launch redirect
//! - Linux host adapter
//! - Activation server
//! - The service loop and signal handling

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wakeguard::{Args, Service, about_text, redirect, report_failure, spawn_signal_forwarder};
use wakeguard_config::{LaunchPlan, parse_launch_args};
use wakeguard_core::APP_TITLE;
use wakeguard_host_api::{MessageLevel, StatusSurface};
use wakeguard_host_linux::{Acquire, DesktopSurface, LinuxHost, LinuxInputInjector, acquire};
use wakeguard_ipc::ActivationServer;
use wakeguard_util::socket_path;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let parsed = Args::try_parse();

    let log_level = parsed.as_ref().map_or("info", |args| args.log_level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let surface = Arc::new(DesktopSurface::detect());

    let args = match parsed {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let e = anyhow::Error::new(e).context("Invalid command line");
            return report_failure(surface.as_ref(), &e).await;
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), "wakeguard starting");

    match launch(args, surface.clone()).await {
        Ok(code) => code,
        Err(e) => report_failure(surface.as_ref(), &e).await,
    }
}

async fn launch(args: Args, surface: Arc<DesktopSurface>) -> Result<ExitCode> {
    let mode = match parse_launch_args(&args.tokens) {
        Ok(LaunchPlan::Suppress(mode)) => mode,
        Ok(LaunchPlan::About) => {
            surface
                .message(MessageLevel::Info, APP_TITLE, &about_text())
                .await;
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => {
            error!(error = %e, "Invalid launch arguments");
            surface
                .message(MessageLevel::Error, APP_TITLE, &e.to_string())
                .await;
            return Ok(ExitCode::FAILURE);
        }
    };

    let name = mode.kind().instance_name();
    let socket = socket_path(&name);

    let lock = match acquire(&name).context("Failed to take the instance lock")? {
        Acquire::Exclusive(lock) => lock,
        Acquire::Deferred => {
            let outcome = redirect(&name, &socket, surface.as_ref()).await;
            info!(?outcome, "Another instance is running, exiting");
            return Ok(ExitCode::SUCCESS);
        }
    };

    let host = Arc::new(LinuxHost::new(LinuxInputInjector::for_mode(&mode), surface));
    let mut service = Service::new(host, mode);

    let _signals = spawn_signal_forwarder(service.shutdown_handle())
        .context("Failed to install signal handlers")?;

    // Without the socket the instance still suppresses; duplicate launches
    // just fall back to the informational message
    let mut server = ActivationServer::new(&socket);
    let started = server.start().await;
    let server = match started {
        Ok(()) => {
            let server = Arc::new(server);
            if let Some(rx) = server.take_message_receiver().await {
                service = service.with_activations(rx);
            }
            let accept = server.clone();
            let accept_task = tokio::spawn(async move {
                if let Err(e) = accept.run().await {
                    error!(error = %e, "Activation server error");
                }
            });
            Some((server, accept_task))
        }
        Err(e) => {
            warn!(error = %e, path = %socket.display(), "Activation server unavailable");
            None
        }
    };

    let result = service.run().await;

    if let Some((server, accept_task)) = server {
        accept_task.abort();
        server.shutdown();
    }
    drop(lock);

    let summary = result.context("Suppression did not start")?;
    info!(reason = %summary.reason, "Shutdown complete");
    Ok(ExitCode::SUCCESS)
}
