//! Periodic, non-overlapping tick scheduler

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};
use wakeguard_util::{Result, WakeguardError};

/// Tick counters shared between the scheduler and the tick job
#[derive(Debug, Default)]
pub struct TickStats {
    delivered: AtomicU64,
    rejected: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`TickStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub delivered: u64,
    pub rejected: u64,
    pub skipped: u64,
}

impl TickSummary {
    /// Ticks that fired, whatever became of them
    pub fn total(&self) -> u64 {
        self.delivered + self.rejected + self.skipped
    }
}

impl TickStats {
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TickSummary {
        TickSummary {
            delivered: self.delivered.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Runs a blocking job every `period`, never two at once.
///
/// The first tick fires one full period after start. A tick that comes due
/// while the previous job is still running is skipped and counted, not queued.
pub struct TickScheduler {
    period: Duration,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TickScheduler {
    /// Start ticking on the current tokio runtime
    pub fn start<F>(period: Duration, stats: Arc<TickStats>, job: F) -> Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| WakeguardError::internal(format!("tick scheduler needs a runtime: {}", e)))?;

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let job = Arc::new(job);

        let task = handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut in_flight: Option<JoinHandle<()>> = None;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if let Some(previous) = &in_flight
                            && !previous.is_finished()
                        {
                            stats.record_skipped();
                            debug!("Previous tick still in flight, skipping");
                            continue;
                        }

                        let job = job.clone();
                        in_flight = Some(tokio::task::spawn_blocking(move || job()));
                    }
                }
            }

            if let Some(previous) = in_flight {
                let _ = previous.await;
            }
        });

        info!(period_secs = period.as_secs(), "Tick scheduler started");

        Ok(Self {
            period,
            stop_tx: Some(stop_tx),
            task: Some(task),
        })
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop ticking and wait for an in-flight job to finish
    pub async fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
            debug!(period_secs = self.period.as_secs(), "Tick scheduler stopped");
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_job(count: Arc<AtomicUsize>) -> impl Fn() + Send + Sync + 'static {
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_at_the_configured_period() {
        let stats = Arc::new(TickStats::default());
        let count = Arc::new(AtomicUsize::new(0));
        let mut scheduler =
            TickScheduler::start(Duration::from_secs(45), stats.clone(), counting_job(count.clone()))
                .unwrap();

        // Due at 45s, 90s and 135s
        tokio::time::sleep(Duration::from_secs(136)).await;
        scheduler.stop().await;

        let summary = stats.snapshot();
        assert_eq!(count.load(Ordering::SeqCst) as u64 + summary.skipped, 3);
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_a_full_period() {
        let stats = Arc::new(TickStats::default());
        let count = Arc::new(AtomicUsize::new(0));
        let mut scheduler =
            TickScheduler::start(Duration::from_secs(45), stats.clone(), counting_job(count.clone()))
                .unwrap();

        tokio::time::sleep(Duration::from_secs(44)).await;
        scheduler.stop().await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(stats.snapshot(), TickSummary::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_ticks_are_skipped_not_queued() {
        let stats = Arc::new(TickStats::default());
        let running = Arc::new(AtomicUsize::new(0));
        let max_running = Arc::new(AtomicUsize::new(0));

        let job = {
            let running = running.clone();
            let max_running = max_running.clone();
            move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                max_running.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(70));
                running.fetch_sub(1, Ordering::SeqCst);
            }
        };

        let mut scheduler =
            TickScheduler::start(Duration::from_millis(20), stats.clone(), job).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        scheduler.stop().await;

        assert!(stats.snapshot().skipped >= 1);
        assert_eq!(max_running.load(Ordering::SeqCst), 1);
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn start_outside_runtime_fails() {
        let stats = Arc::new(TickStats::default());
        let result = TickScheduler::start(Duration::from_secs(10), stats, || {});
        assert!(result.is_err());
    }

    #[test]
    fn summary_total() {
        let stats = TickStats::default();
        stats.record_delivered();
        stats.record_rejected();
        stats.record_skipped();
        assert_eq!(stats.snapshot().total(), 3);
    }
}
