//! Status surface model: tray interactions and prompt outcomes

use serde::{Deserialize, Serialize};

/// Interactions reported by the tray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrayEvent {
    /// Primary-button click on the tray icon (or an equivalent activation)
    PrimaryClick,
    /// The "Exit" menu item was selected
    MenuExit,
}

/// How the user answered a status prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptOutcome {
    /// OK: stop suppression and exit
    Confirmed,
    /// Cancel or closed
    Dismissed,
}

/// Severity of a one-way message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Info,
    Error,
}
