//! Linux host adapter implementation

use std::sync::Arc;
use tracing::info;
use wakeguard_host_api::{
    Host, HostCapabilities, InputInjector, PowerRequest, StatusSurface,
};

use crate::{DesktopSurface, LinuxInputInjector, LinuxPowerRequest};

/// Linux host adapter
pub struct LinuxHost {
    capabilities: HostCapabilities,
    power: Arc<LinuxPowerRequest>,
    input: Arc<LinuxInputInjector>,
    surface: Arc<DesktopSurface>,
}

impl LinuxHost {
    /// Assemble the host from detected backends.
    ///
    /// Input detection connects to X or the session bus, so only detect it
    /// once the instance lock is held.
    pub fn new(input: LinuxInputInjector, surface: Arc<DesktopSurface>) -> Self {
        let capabilities = HostCapabilities {
            can_declare: true,
            input_backend: input.backend(),
            has_dialogs: surface.has_dialogs(),
        };

        info!(
            input_backend = ?capabilities.input_backend,
            has_dialogs = capabilities.has_dialogs,
            "Linux host initialized"
        );

        Self {
            capabilities,
            power: Arc::new(LinuxPowerRequest::new()),
            input: Arc::new(input),
            surface,
        }
    }
}

impl Host for LinuxHost {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    fn power(&self) -> Arc<dyn PowerRequest> {
        self.power.clone()
    }

    fn input(&self) -> Arc<dyn InputInjector> {
        self.input.clone()
    }

    fn surface(&self) -> Arc<dyn StatusSurface> {
        self.surface.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DialogBackend;
    use wakeguard_api::{SuppressionMode, TickInterval};
    use wakeguard_host_api::InputBackend;

    #[test]
    fn capabilities_follow_detected_backends() {
        let host = LinuxHost::new(
            LinuxInputInjector::Unavailable,
            Arc::new(DesktopSurface::new(DialogBackend::Console)),
        );

        let caps = host.capabilities();
        assert_eq!(caps.input_backend, InputBackend::None);
        assert!(!caps.has_dialogs);
        assert!(caps.supports(&SuppressionMode::Declarative));
        assert!(!caps.supports(&SuppressionMode::synthetic(TickInterval::DEFAULT)));
    }
}
