//! Suppression engine

use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wakeguard_api::{SuppressionMode, SuppressionState, TickInterval};
use wakeguard_host_api::{ExecutionState, Host, InputBatch, InputInjector, PowerRequest};
use wakeguard_util::{Result, WakeguardError};

use crate::{TickScheduler, TickStats, TickSummary};

/// How suppression is carried out, chosen once at construction
pub enum SuppressionStrategy {
    /// Hold a continuous stay-awake request
    Declarative { power: Arc<dyn PowerRequest> },

    /// Inject an idle-reset batch every `interval`
    SyntheticInput {
        input: Arc<dyn InputInjector>,
        interval: TickInterval,
        scheduler: Option<TickScheduler>,
    },
}

/// The single owned handle on this process's suppression effects.
///
/// `release()` undoes them exactly once. If the engine is dropped without an
/// explicit release, `Drop` restores the power baseline and aborts the
/// scheduler.
pub struct SuppressionEngine {
    mode: SuppressionMode,
    strategy: SuppressionStrategy,
    stats: Arc<TickStats>,
    since: Option<DateTime<Local>>,
    released: bool,
}

impl SuppressionEngine {
    pub fn new(mode: SuppressionMode, host: &dyn Host) -> Self {
        let strategy = match mode {
            SuppressionMode::Declarative => SuppressionStrategy::Declarative {
                power: host.power(),
            },
            SuppressionMode::SyntheticInput { interval } => SuppressionStrategy::SyntheticInput {
                input: host.input(),
                interval,
                scheduler: None,
            },
        };

        debug!(mode = %mode, "Suppression engine created");

        Self {
            mode,
            strategy,
            stats: Arc::new(TickStats::default()),
            since: None,
            released: false,
        }
    }

    pub fn mode(&self) -> SuppressionMode {
        self.mode
    }

    /// Start suppressing. Repeated calls have no further effect.
    pub fn assert(&mut self) -> Result<SuppressionState> {
        if self.released {
            return Err(WakeguardError::internal("suppression engine already released"));
        }

        match &mut self.strategy {
            SuppressionStrategy::Declarative { power } => {
                if let Err(e) = power.set_state(ExecutionState::SUPPRESSING) {
                    warn!(error = %e, "Power request failed, restoring baseline");
                    if let Err(e) = power.set_state(ExecutionState::BASELINE) {
                        warn!(error = %e, "Failed to restore power baseline");
                    }
                    return Err(WakeguardError::host(e.to_string()));
                }
            }
            SuppressionStrategy::SyntheticInput {
                input,
                interval,
                scheduler,
            } => {
                if scheduler.is_none() {
                    let input = input.clone();
                    let stats = self.stats.clone();
                    *scheduler = Some(TickScheduler::start(
                        interval.as_duration(),
                        self.stats.clone(),
                        move || synthesize_tick(input.as_ref(), &stats),
                    )?);
                }
            }
        }

        let since = *self.since.get_or_insert_with(Local::now);
        info!(mode = %self.mode, since = %since.format("%H:%M:%S"), "Suppression asserted");

        Ok(SuppressionState::active(self.mode, since))
    }

    /// One suppression tick. A no-op for the declarative strategy.
    ///
    /// Blocking; the scheduler runs it off the event loop.
    pub fn tick(&self) {
        if let SuppressionStrategy::SyntheticInput { input, .. } = &self.strategy {
            synthesize_tick(input.as_ref(), &self.stats);
        }
    }

    /// Undo every suppression effect and return the baseline state.
    ///
    /// Only the first call does anything.
    pub async fn release(&mut self) -> SuppressionState {
        if self.released {
            return SuppressionState::baseline(self.mode);
        }
        self.released = true;

        match &mut self.strategy {
            SuppressionStrategy::Declarative { power } => restore_baseline(power.as_ref()),
            SuppressionStrategy::SyntheticInput { scheduler, .. } => {
                if let Some(mut scheduler) = scheduler.take() {
                    scheduler.stop().await;
                }
                let summary = self.stats.snapshot();
                info!(
                    delivered = summary.delivered,
                    rejected = summary.rejected,
                    skipped = summary.skipped,
                    "Synthetic input stopped"
                );
            }
        }

        self.since = None;
        info!(mode = %self.mode, "Suppression released");
        SuppressionState::baseline(self.mode)
    }

    /// Current state of the engine
    pub fn state(&self) -> SuppressionState {
        match self.since {
            Some(since) if !self.released => SuppressionState::active(self.mode, since),
            _ => SuppressionState::baseline(self.mode),
        }
    }

    pub fn stats(&self) -> TickSummary {
        self.stats.snapshot()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for SuppressionEngine {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        warn!(mode = %self.mode, "Suppression engine dropped without release");
        match &mut self.strategy {
            SuppressionStrategy::Declarative { power } => restore_baseline(power.as_ref()),
            SuppressionStrategy::SyntheticInput { scheduler, .. } => {
                // Dropping aborts the tick task
                scheduler.take();
            }
        }
    }
}

fn restore_baseline(power: &dyn PowerRequest) {
    if let Err(e) = power.set_state(ExecutionState::BASELINE) {
        warn!(error = %e, "Failed to restore power baseline");
    }
}

/// Inject one idle-reset batch. Failures are logged and counted, never
/// propagated: the next tick simply tries again.
pub fn synthesize_tick(input: &dyn InputInjector, stats: &TickStats) {
    match input.inject(&InputBatch::idle_reset()) {
        Ok(delivered) => {
            stats.record_delivered();
            debug!(events = delivered, "Idle timer reset");
        }
        Err(e) => {
            stats.record_rejected();
            warn!(error = %e, "Synthetic input rejected, retrying next tick");
        }
    }
}
