//! The service loop
//!
//! One task owns the lifecycle controller and the suppression engine. Tray
//! events, forwarded activations, prompt answers and exit requests all arrive
//! as channel messages and are handled in order.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use wakeguard_api::{SuppressionMode, SuppressionState};
use wakeguard_core::{
    ExitReason, LifecycleController, LifecycleEvent, LifecycleState, PendingPrompt, StatusGate,
    SuppressionEngine, TickSummary,
};
use wakeguard_host_api::{Host, PromptOutcome, StatusSurface, TrayEvent};
use wakeguard_ipc::ServerMessage;
use wakeguard_util::{Result, WakeguardError};

use crate::ShutdownHandle;

/// How a completed run ended
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reason: ExitReason,
    pub baseline: SuppressionState,
    pub ticks: TickSummary,
    pub prompts_shown: usize,
}

type PromptAnswer = (PromptOutcome, PendingPrompt);

/// Main service state
pub struct Service {
    host: Arc<dyn Host>,
    mode: SuppressionMode,
    gate: StatusGate,
    exit_tx: mpsc::UnboundedSender<ExitReason>,
    exit_rx: mpsc::UnboundedReceiver<ExitReason>,
    activations: Option<mpsc::UnboundedReceiver<ServerMessage>>,
}

impl Service {
    pub fn new(host: Arc<dyn Host>, mode: SuppressionMode) -> Self {
        let (exit_tx, exit_rx) = mpsc::unbounded_channel();

        Self {
            host,
            mode,
            gate: StatusGate::new(),
            exit_tx,
            exit_rx,
            activations: None,
        }
    }

    /// Accept activations forwarded by duplicate launches
    pub fn with_activations(mut self, rx: mpsc::UnboundedReceiver<ServerMessage>) -> Self {
        self.activations = Some(rx);
        self
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(self.exit_tx.clone())
    }

    /// Assert suppression, serve interactions until an exit is requested, then
    /// release suppression and remove the tray.
    ///
    /// An error means suppression never started; the OS is at baseline.
    pub async fn run(mut self) -> Result<RunSummary> {
        let capabilities = self.host.capabilities();
        if !capabilities.supports(&self.mode) {
            error!(mode = %self.mode, ?capabilities, "Suppression mode not supported here");
            return Err(WakeguardError::host(format!(
                "{} is not supported on this desktop",
                self.mode
            )));
        }

        let surface = self.host.surface();
        let mut tray_events = surface
            .subscribe()
            .map_err(|e| WakeguardError::host(e.to_string()))?;

        let mut controller = LifecycleController::new(self.gate.clone());
        let mut engine = SuppressionEngine::new(self.mode, self.host.as_ref());

        let state = match engine.assert() {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, "Failed to assert suppression");
                controller.request_exit(ExitReason::StartupFailed);
                let baseline = engine.release().await;
                controller.finish(baseline)?;
                return Err(e);
            }
        };

        if let LifecycleEvent::TrayShown(presence) = controller.started(state)? {
            surface.show_tray(&presence);
        }

        let (prompt_tx, mut prompt_rx) = mpsc::unbounded_channel::<PromptAnswer>();
        let mut prompt_task: Option<JoinHandle<()>> = None;
        let mut prompts_shown = 0;
        let mut activations = self.activations.take();

        info!(mode = %self.mode, "Service running");

        let reason = loop {
            let event = tokio::select! {
                Some(reason) = self.exit_rx.recv() => controller.request_exit(reason),

                Some(event) = tray_events.recv() => match event {
                    TrayEvent::PrimaryClick => controller.primary_interaction(),
                    TrayEvent::MenuExit => controller.request_exit(ExitReason::MenuExit),
                },

                Some(message) = recv_activation(&mut activations) => match message {
                    ServerMessage::Activate { request_id, reply } => {
                        debug!(request_id, "Activation forwarded by a duplicate launch");
                        let event = controller.primary_interaction();
                        let _ = reply.send(matches!(event, LifecycleEvent::StatusRequested(_)));
                        event
                    }
                },

                Some((outcome, prompt)) = prompt_rx.recv() => {
                    prompt_task = None;
                    controller.prompt_resolved(outcome, prompt)
                }
            };

            if let LifecycleEvent::StatusRequested(prompt) = event {
                prompts_shown += 1;
                prompt_task = Some(spawn_prompt(surface.clone(), prompt, prompt_tx.clone()));
            }

            if let LifecycleState::Exiting { reason } = controller.state() {
                break reason;
            }
        };

        // An open prompt is moot once exiting; dropping it frees the gate
        if let Some(task) = prompt_task.take() {
            task.abort();
        }

        let baseline = engine.release().await;
        surface.hide_tray();
        controller.finish(baseline.clone())?;

        let ticks = engine.stats();
        info!(
            %reason,
            prompts_shown,
            ticks_delivered = ticks.delivered,
            "Service stopped"
        );

        Ok(RunSummary {
            reason,
            baseline,
            ticks,
            prompts_shown,
        })
    }
}

async fn recv_activation(
    activations: &mut Option<mpsc::UnboundedReceiver<ServerMessage>>,
) -> Option<ServerMessage> {
    match activations {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Show the prompt off the loop; the answer comes back with the prompt so the
/// gate stays held until the controller sees it
fn spawn_prompt(
    surface: Arc<dyn StatusSurface>,
    prompt: PendingPrompt,
    answers: mpsc::UnboundedSender<PromptAnswer>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = match surface.prompt(prompt.message()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Status prompt unavailable");
                PromptOutcome::Dismissed
            }
        };
        let _ = answers.send((outcome, prompt));
    })
}
