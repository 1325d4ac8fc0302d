//! Status notifier and its re-entrancy gate

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use wakeguard_api::{StatusMessage, SuppressionMode, SuppressionState};

/// Title used for every dialog the process shows
pub const APP_TITLE: &str = "wakeguard";

/// Single exclusive flag: at most one status prompt per instance
#[derive(Debug, Clone, Default)]
pub struct StatusGate(Arc<AtomicBool>);

impl StatusGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate, or `None` if a prompt already holds it
    pub fn try_open(&self) -> Option<GateGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GateGuard(self.0.clone()))
    }

    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Holds the gate until dropped
#[derive(Debug)]
pub struct GateGuard(Arc<AtomicBool>);

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A status prompt that is (about to be) on screen
pub struct PendingPrompt {
    message: StatusMessage,
    _guard: GateGuard,
}

impl PendingPrompt {
    pub fn message(&self) -> &StatusMessage {
        &self.message
    }
}

impl fmt::Debug for PendingPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingPrompt")
            .field("title", &self.message.title)
            .finish()
    }
}

/// Renders the current suppression configuration into a prompt
#[derive(Debug, Clone, Default)]
pub struct StatusNotifier {
    gate: StatusGate,
}

impl StatusNotifier {
    pub fn new(gate: StatusGate) -> Self {
        Self { gate }
    }

    /// Open a prompt for `state`, or `None` if one is already showing
    pub fn begin(&self, state: &SuppressionState) -> Option<PendingPrompt> {
        let guard = self.gate.try_open()?;
        Some(PendingPrompt {
            message: Self::render(state),
            _guard: guard,
        })
    }

    pub fn render(state: &SuppressionState) -> StatusMessage {
        let mut body = match state.mode() {
            SuppressionMode::Declarative => {
                "Screensaver and display sleep are held off by a stay-awake request.".to_string()
            }
            SuppressionMode::SyntheticInput { interval } => {
                let (minutes, seconds) = interval.minutes_and_seconds();
                format!(
                    "Screensaver is held off by synthetic input every {} min {} s.",
                    minutes, seconds
                )
            }
        };

        if let Some(since) = state.since() {
            body.push_str(&format!("\nActive since {}.", since.format("%H:%M")));
        }
        body.push_str("\n\nPress OK to stop suppression and exit.");

        StatusMessage {
            title: APP_TITLE.to_string(),
            body,
            confirm_label: "OK".into(),
            dismiss_label: "Cancel".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use wakeguard_api::TickInterval;

    #[test]
    fn gate_admits_one_holder() {
        let gate = StatusGate::new();
        let first = gate.try_open();
        assert!(first.is_some());
        assert!(gate.try_open().is_none());
        assert!(gate.is_open());

        drop(first);
        assert!(!gate.is_open());
        assert!(gate.try_open().is_some());
    }

    #[test]
    fn clones_share_the_gate() {
        let gate = StatusGate::new();
        let other = gate.clone();
        let _guard = gate.try_open().unwrap();
        assert!(other.try_open().is_none());
    }

    #[test]
    fn rapid_begins_collapse_into_one_prompt() {
        let notifier = StatusNotifier::default();
        let state = SuppressionState::baseline(SuppressionMode::Declarative);

        let first = notifier.begin(&state);
        let second = notifier.begin(&state);
        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[test]
    fn synthetic_body_shows_minutes_and_seconds() {
        let interval = TickInterval::from_secs(125).unwrap();
        let since = Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let state = SuppressionState::active(SuppressionMode::synthetic(interval), since);

        let message = StatusNotifier::render(&state);
        assert!(message.body.contains("every 2 min 5 s"));
        assert!(message.body.contains("Active since 09:30"));
        assert!(message.body.contains("Press OK"));
        assert_eq!(message.title, APP_TITLE);
    }

    #[test]
    fn declarative_body_has_no_interval() {
        let state = SuppressionState::active(SuppressionMode::Declarative, Local::now());
        let message = StatusNotifier::render(&state);
        assert!(message.body.contains("stay-awake request"));
        assert!(!message.body.contains(" min "));
    }
}
