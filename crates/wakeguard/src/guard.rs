//! What a duplicate launch does instead of suppressing

use std::path::Path;
use tracing::{info, warn};
use wakeguard_api::ResponsePayload;
use wakeguard_core::APP_TITLE;
use wakeguard_host_api::{MessageLevel, StatusSurface};
use wakeguard_ipc::{ACTIVATION_TIMEOUT, forward_activation};
use wakeguard_util::{InstanceName, WakeguardError};

/// Outcome of a launch that found the instance lock taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// The primary received the activation
    Forwarded { prompt_opened: bool },
    /// The primary could not be reached; the user was told it is running
    Informed,
}

/// Forward an activation to the primary holding `name`, or tell the user it
/// is already running. The primary is never disturbed beyond the activation.
pub async fn redirect(
    name: &InstanceName,
    socket_path: &Path,
    surface: &dyn StatusSurface,
) -> Redirect {
    match forward_activation(socket_path, ACTIVATION_TIMEOUT).await {
        Ok(ResponsePayload::Activated { prompt_opened }) => {
            info!(instance = %name, prompt_opened, "Activated the running instance");
            Redirect::Forwarded { prompt_opened }
        }
        Err(e) => {
            let conflict = WakeguardError::conflict(name.to_string());
            warn!(instance = %name, error = %e, conflict = %conflict, "Running instance not reachable");
            surface
                .message(MessageLevel::Info, APP_TITLE, &already_running_text(&conflict))
                .await;
            Redirect::Informed
        }
    }
}

fn already_running_text(conflict: &WakeguardError) -> String {
    format!(
        "wakeguard is already running.\n{}.\n\
         Use the running instance to see its status or to stop it.",
        conflict
    )
}
