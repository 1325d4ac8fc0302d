//! Events emitted by the lifecycle controller

use std::fmt;
use wakeguard_api::{SuppressionState, TrayPresence};

use crate::PendingPrompt;

/// Why the process is shutting down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// "Exit" selected in the tray menu
    MenuExit,
    /// Status prompt confirmed
    StatusConfirmed,
    /// OS termination notification (signal name)
    Signal(&'static str),
    /// Suppression could not be asserted
    StartupFailed,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::MenuExit => write!(f, "menu exit"),
            ExitReason::StatusConfirmed => write!(f, "status confirmed"),
            ExitReason::Signal(name) => write!(f, "signal {}", name),
            ExitReason::StartupFailed => write!(f, "startup failed"),
        }
    }
}

/// What the service loop should do after feeding the controller an input
#[derive(Debug)]
pub enum LifecycleEvent {
    /// Show this tray presence
    TrayShown(TrayPresence),

    /// Show this status prompt; the gate stays held until it is resolved
    StatusRequested(PendingPrompt),

    /// A prompt is already open, nothing to show
    StatusSuppressed,

    /// Prompt dismissed, back to running
    StatusClosed,

    /// Release suppression, then finish
    ExitRequested(ExitReason),

    /// Input had no effect in the current state
    Ignored,

    /// Suppression is back at baseline and the tray is gone
    Terminated {
        reason: ExitReason,
        baseline: SuppressionState,
    },
}
