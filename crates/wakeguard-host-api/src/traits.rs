//! Host adapter traits

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use wakeguard_api::{StatusMessage, TrayPresence};

use crate::{
    ExecutionState, HostCapabilities, InputBatch, MessageLevel, PromptOutcome, TrayEvent,
};

/// Errors from host adapter operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Not available on this host: {0}")]
    Unavailable(String),

    #[error("D-Bus error: {0}")]
    DBus(String),

    #[error("Input injection rejected: {0}")]
    InjectionRejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// OS power request: the declarative "stay awake" switch
pub trait PowerRequest: Send + Sync {
    /// Replace the declared execution state, returning the previous one.
    /// Setting the state already held is a no-op.
    fn set_state(&self, state: ExecutionState) -> HostResult<ExecutionState>;

    /// State currently declared by this process
    fn current(&self) -> ExecutionState;
}

/// Synthetic input delivery
pub trait InputInjector: Send + Sync {
    /// Inject all events of the batch as one unit, returning how many were
    /// delivered. Blocking; callers run it off the event loop.
    fn inject(&self, batch: &InputBatch) -> HostResult<usize>;
}

/// Tray presence and user-facing dialogs
#[async_trait]
pub trait StatusSurface: Send + Sync {
    /// Show or update the tray presence
    fn show_tray(&self, presence: &TrayPresence);

    /// Remove the tray presence
    fn hide_tray(&self);

    /// Subscribe to tray interactions. Only one subscriber is supported.
    fn subscribe(&self) -> HostResult<mpsc::UnboundedReceiver<TrayEvent>>;

    /// Show a confirm/dismiss prompt and wait for the answer
    async fn prompt(&self, message: &StatusMessage) -> HostResult<PromptOutcome>;

    /// Show a one-way message and wait until it is acknowledged
    async fn message(&self, level: MessageLevel, title: &str, body: &str);
}

/// Platform host: the three seams the suppression core talks to
pub trait Host: Send + Sync {
    /// Get the capabilities of this host
    fn capabilities(&self) -> &HostCapabilities;

    fn power(&self) -> Arc<dyn PowerRequest>;

    fn input(&self) -> Arc<dyn InputInjector>;

    fn surface(&self) -> Arc<dyn StatusSurface>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        let err: HostError = std::io::Error::other("boom").into();
        assert!(err.to_string().contains("boom"));
    }
}
