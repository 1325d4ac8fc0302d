//! What a launch resolves to

use std::fmt;
use wakeguard_api::{SuppressionMode, TickInterval};

/// Outcome of parsing the launch arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchPlan {
    /// Acquire the instance lock and suppress in this mode
    Suppress(SuppressionMode),
    /// Show the about dialog and exit
    About,
}

impl fmt::Display for LaunchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchPlan::Suppress(mode) => write!(f, "suppress ({})", mode),
            LaunchPlan::About => write!(f, "about"),
        }
    }
}

/// Mode used when no argument is given
pub fn default_mode() -> SuppressionMode {
    if cfg!(feature = "synthetic-default") {
        SuppressionMode::synthetic(TickInterval::DEFAULT)
    } else {
        SuppressionMode::Declarative
    }
}
