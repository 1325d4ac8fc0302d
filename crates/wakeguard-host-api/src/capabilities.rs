//! Host capabilities model

use serde::{Deserialize, Serialize};
use wakeguard_api::SuppressionMode;

/// Mechanism used to deliver synthetic input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputBackend {
    /// X11 XTest extension
    XTest,
    /// `SimulateUserActivity` on the session screensaver service
    DbusActivity,
    /// In-memory test double
    Mock,
    /// No way to inject input
    None,
}

/// Describes what a host adapter can do
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostCapabilities {
    /// Can hold a declarative stay-awake request
    pub can_declare: bool,

    /// How synthetic input is delivered, if at all
    pub input_backend: InputBackend,

    /// Can show modal dialogs (otherwise prompts fall back to the console)
    pub has_dialogs: bool,
}

impl HostCapabilities {
    /// Declarative suppression only, console prompts
    pub fn minimal() -> Self {
        Self {
            can_declare: true,
            input_backend: InputBackend::None,
            has_dialogs: false,
        }
    }

    /// Everything, backed by in-memory doubles
    pub fn mock() -> Self {
        Self {
            can_declare: true,
            input_backend: InputBackend::Mock,
            has_dialogs: true,
        }
    }

    pub fn can_inject_input(&self) -> bool {
        self.input_backend != InputBackend::None
    }

    /// Check if this host can run the given suppression mode
    pub fn supports(&self, mode: &SuppressionMode) -> bool {
        match mode {
            SuppressionMode::Declarative => self.can_declare,
            SuppressionMode::SyntheticInput { .. } => self.can_inject_input(),
        }
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::minimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wakeguard_api::TickInterval;

    #[test]
    fn minimal_cannot_inject() {
        let caps = HostCapabilities::minimal();
        assert!(caps.supports(&SuppressionMode::Declarative));
        assert!(!caps.supports(&SuppressionMode::synthetic(TickInterval::DEFAULT)));
    }

    #[test]
    fn mock_supports_both_modes() {
        let caps = HostCapabilities::mock();
        assert!(caps.supports(&SuppressionMode::Declarative));
        assert!(caps.supports(&SuppressionMode::synthetic(TickInterval::DEFAULT)));
    }

    #[test]
    fn capabilities_serialization() {
        let json = serde_json::to_string(&HostCapabilities::minimal()).unwrap();
        assert!(json.contains(r#""input_backend":"none""#));
    }
}
