//! Exit requests from outside the service loop

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;
use wakeguard_core::ExitReason;

/// Asks a running [`crate::Service`] to exit
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: mpsc::UnboundedSender<ExitReason>,
}

impl ShutdownHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<ExitReason>) -> Self {
        Self { tx }
    }

    /// Request an exit. Ignored once the service is already exiting.
    pub fn request(&self, reason: ExitReason) {
        let _ = self.tx.send(reason);
    }
}

/// Turn SIGTERM, SIGINT and SIGHUP into exit requests.
///
/// SIGHUP is what a session logoff delivers, so it gets the same orderly
/// release as an explicit exit.
pub fn spawn_signal_forwarder(handle: ShutdownHandle) -> Result<JoinHandle<()>> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
                _ = sighup.recv() => "SIGHUP",
            };
            info!(signal = name, "Received termination signal");
            handle.request(ExitReason::Signal(name));
        }
    }))
}
