//! Lifecycle state machine
//!
//! Pure state: the service loop feeds inputs in and acts on the returned
//! [`LifecycleEvent`]s. The controller never touches the OS.

use tracing::{debug, info, warn};
use wakeguard_api::{SuppressionState, TrayPresence};
use wakeguard_host_api::PromptOutcome;
use wakeguard_util::{Result, WakeguardError};

use crate::{ExitReason, LifecycleEvent, PendingPrompt, StatusGate, StatusNotifier};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Lock held, suppression being asserted
    Starting,
    /// Suppressing, waiting for interaction or a termination notification
    Running,
    /// A status prompt is on screen
    ShowingStatus,
    /// Releasing suppression
    Exiting { reason: ExitReason },
    /// Everything undone
    Terminal { reason: ExitReason },
}

impl LifecycleState {
    pub fn is_exiting(&self) -> bool {
        matches!(
            self,
            LifecycleState::Exiting { .. } | LifecycleState::Terminal { .. }
        )
    }
}

pub struct LifecycleController {
    state: LifecycleState,
    suppression: Option<SuppressionState>,
    notifier: StatusNotifier,
}

impl LifecycleController {
    pub fn new(gate: StatusGate) -> Self {
        Self {
            state: LifecycleState::Starting,
            suppression: None,
            notifier: StatusNotifier::new(gate),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Suppression is asserted: go to Running and show the tray
    pub fn started(&mut self, suppression: SuppressionState) -> Result<LifecycleEvent> {
        if self.state != LifecycleState::Starting {
            return Err(self.reject("started"));
        }
        if !suppression.is_active() {
            return Err(WakeguardError::transition(
                "cannot run without active suppression",
            ));
        }

        let presence = TrayPresence::for_state(&suppression);
        self.suppression = Some(suppression);
        self.state = LifecycleState::Running;
        info!("Lifecycle: Starting -> Running");

        Ok(LifecycleEvent::TrayShown(presence))
    }

    /// Primary tray click, or an activation forwarded by a duplicate launch
    pub fn primary_interaction(&mut self) -> LifecycleEvent {
        match self.state {
            LifecycleState::Running | LifecycleState::ShowingStatus => {}
            _ => {
                debug!(state = ?self.state, "Primary interaction ignored");
                return LifecycleEvent::Ignored;
            }
        }

        let Some(suppression) = &self.suppression else {
            return LifecycleEvent::Ignored;
        };

        match self.notifier.begin(suppression) {
            Some(prompt) => {
                self.state = LifecycleState::ShowingStatus;
                info!("Lifecycle: Running -> ShowingStatus");
                LifecycleEvent::StatusRequested(prompt)
            }
            None => {
                debug!("Status prompt already open");
                LifecycleEvent::StatusSuppressed
            }
        }
    }

    /// The status prompt was answered. Consumes the prompt, which frees the gate.
    pub fn prompt_resolved(
        &mut self,
        outcome: PromptOutcome,
        prompt: PendingPrompt,
    ) -> LifecycleEvent {
        drop(prompt);

        if self.state != LifecycleState::ShowingStatus {
            debug!(state = ?self.state, ?outcome, "Late prompt answer ignored");
            return LifecycleEvent::Ignored;
        }

        match outcome {
            PromptOutcome::Confirmed => self.begin_exit(ExitReason::StatusConfirmed),
            PromptOutcome::Dismissed => {
                self.state = LifecycleState::Running;
                info!("Lifecycle: ShowingStatus -> Running");
                LifecycleEvent::StatusClosed
            }
        }
    }

    /// Menu exit, OS termination notification, or failed startup
    pub fn request_exit(&mut self, reason: ExitReason) -> LifecycleEvent {
        if self.state.is_exiting() {
            debug!(%reason, "Already exiting");
            return LifecycleEvent::Ignored;
        }
        self.begin_exit(reason)
    }

    /// Suppression released and tray hidden
    pub fn finish(&mut self, baseline: SuppressionState) -> Result<LifecycleEvent> {
        let LifecycleState::Exiting { reason } = self.state else {
            return Err(self.reject("finish"));
        };
        if baseline.is_active() {
            return Err(WakeguardError::transition(
                "cannot terminate while suppression is active",
            ));
        }

        self.state = LifecycleState::Terminal { reason };
        self.suppression = Some(baseline.clone());
        info!(%reason, "Lifecycle: Exiting -> Terminal");

        Ok(LifecycleEvent::Terminated { reason, baseline })
    }

    fn begin_exit(&mut self, reason: ExitReason) -> LifecycleEvent {
        info!(from = ?self.state, %reason, "Lifecycle: -> Exiting");
        self.state = LifecycleState::Exiting { reason };
        LifecycleEvent::ExitRequested(reason)
    }

    fn reject(&self, input: &str) -> WakeguardError {
        warn!(state = ?self.state, input, "Invalid lifecycle transition");
        WakeguardError::transition(format!("{} in state {:?}", input, self.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use wakeguard_api::SuppressionMode;

    fn active() -> SuppressionState {
        SuppressionState::active(SuppressionMode::Declarative, Local::now())
    }

    fn running() -> LifecycleController {
        let mut controller = LifecycleController::new(StatusGate::new());
        controller.started(active()).unwrap();
        controller
    }

    fn open_prompt(controller: &mut LifecycleController) -> PendingPrompt {
        match controller.primary_interaction() {
            LifecycleEvent::StatusRequested(prompt) => prompt,
            other => panic!("expected a prompt, got {:?}", other),
        }
    }

    #[test]
    fn start_shows_tray() {
        let mut controller = LifecycleController::new(StatusGate::new());
        match controller.started(active()).unwrap() {
            LifecycleEvent::TrayShown(presence) => assert!(presence.visible),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(controller.state(), LifecycleState::Running);
    }

    #[test]
    fn start_requires_active_suppression() {
        let mut controller = LifecycleController::new(StatusGate::new());
        let baseline = SuppressionState::baseline(SuppressionMode::Declarative);
        assert!(controller.started(baseline).is_err());
        assert_eq!(controller.state(), LifecycleState::Starting);
    }

    #[test]
    fn started_twice_is_invalid() {
        let mut controller = running();
        assert!(matches!(
            controller.started(active()),
            Err(WakeguardError::InvalidTransition(_))
        ));
    }

    #[test]
    fn click_before_start_is_ignored() {
        let mut controller = LifecycleController::new(StatusGate::new());
        assert!(matches!(
            controller.primary_interaction(),
            LifecycleEvent::Ignored
        ));
    }

    #[test]
    fn second_click_while_prompt_open_is_suppressed() {
        let mut controller = running();
        let prompt = open_prompt(&mut controller);

        assert!(matches!(
            controller.primary_interaction(),
            LifecycleEvent::StatusSuppressed
        ));
        assert_eq!(controller.state(), LifecycleState::ShowingStatus);
        drop(prompt);
    }

    #[test]
    fn dismissal_returns_to_running_and_frees_gate() {
        let gate = StatusGate::new();
        let mut controller = LifecycleController::new(gate.clone());
        controller.started(active()).unwrap();

        let prompt = open_prompt(&mut controller);
        assert!(gate.is_open());

        assert!(matches!(
            controller.prompt_resolved(PromptOutcome::Dismissed, prompt),
            LifecycleEvent::StatusClosed
        ));
        assert_eq!(controller.state(), LifecycleState::Running);
        assert!(!gate.is_open());

        // A new prompt can open again
        let _prompt = open_prompt(&mut controller);
    }

    #[test]
    fn confirmation_exits() {
        let mut controller = running();
        let prompt = open_prompt(&mut controller);

        assert!(matches!(
            controller.prompt_resolved(PromptOutcome::Confirmed, prompt),
            LifecycleEvent::ExitRequested(ExitReason::StatusConfirmed)
        ));
        assert_eq!(
            controller.state(),
            LifecycleState::Exiting {
                reason: ExitReason::StatusConfirmed
            }
        );
    }

    #[test]
    fn signal_while_prompt_open_exits_and_late_answer_is_ignored() {
        let mut controller = running();
        let prompt = open_prompt(&mut controller);

        assert!(matches!(
            controller.request_exit(ExitReason::Signal("SIGTERM")),
            LifecycleEvent::ExitRequested(ExitReason::Signal("SIGTERM"))
        ));
        assert!(matches!(
            controller.prompt_resolved(PromptOutcome::Dismissed, prompt),
            LifecycleEvent::Ignored
        ));
        assert!(controller.state().is_exiting());
    }

    #[test]
    fn second_exit_request_is_ignored() {
        let mut controller = running();
        controller.request_exit(ExitReason::MenuExit);
        assert!(matches!(
            controller.request_exit(ExitReason::Signal("SIGHUP")),
            LifecycleEvent::Ignored
        ));
        assert_eq!(
            controller.state(),
            LifecycleState::Exiting {
                reason: ExitReason::MenuExit
            }
        );
    }

    #[test]
    fn startup_failure_can_exit_from_starting() {
        let mut controller = LifecycleController::new(StatusGate::new());
        controller.request_exit(ExitReason::StartupFailed);
        let baseline = SuppressionState::baseline(SuppressionMode::Declarative);
        assert!(matches!(
            controller.finish(baseline).unwrap(),
            LifecycleEvent::Terminated {
                reason: ExitReason::StartupFailed,
                ..
            }
        ));
    }

    #[test]
    fn finish_requires_baseline() {
        let mut controller = running();
        controller.request_exit(ExitReason::MenuExit);

        assert!(controller.finish(active()).is_err());

        let baseline = SuppressionState::baseline(SuppressionMode::Declarative);
        controller.finish(baseline).unwrap();
        assert_eq!(
            controller.state(),
            LifecycleState::Terminal {
                reason: ExitReason::MenuExit
            }
        );
    }

    #[test]
    fn finish_before_exit_is_invalid() {
        let mut controller = running();
        let baseline = SuppressionState::baseline(SuppressionMode::Declarative);
        assert!(controller.finish(baseline).is_err());
        assert_eq!(controller.state(), LifecycleState::Running);
    }
}
