//! Periodic background re-check of every monitored domain

use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use super::{CycleReport, Monitor};

/// Default time between check cycles
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Whether a tick has anything to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    /// Registry is empty
    Idle,
    /// One or more domains are registered
    Running,
}

pub struct Scheduler {
    monitor: Monitor,
    interval: Duration,
}

impl Scheduler {
    pub fn new(monitor: Monitor, interval: Duration) -> Self {
        Self { monitor, interval }
    }

    /// Run one cycle now. Returns `None` when the registry is empty.
    pub async fn tick(&self) -> Option<CycleReport> {
        if self.monitor.scheduler_state().await == SchedulerState::Idle {
            debug!("No domains registered, skipping check cycle");
            return None;
        }

        debug!("Running certificate check cycle");
        let report = self.monitor.run_cycle().await;
        let errors = report.snapshots.iter().filter(|s| s.is_error()).count();
        info!(
            "Check cycle complete: {} domains, {} errors, {} alerts",
            report.snapshots.len(),
            errors,
            report.notified.len()
        );
        Some(report)
    }

    /// Sleep one interval, check, repeat, until `shutdown` flips to true or
    /// its sender is dropped. A cycle in progress always runs to completion.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting certificate check scheduler (interval: {}s)",
            self.interval.as_secs()
        );

        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer.tick().await; // Skip first immediate tick

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Certificate check scheduler stopping");
                        break;
                    }
                }
            }
        }
    }

    /// Run the loop on its own task
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown, rx) = watch::channel(false);
        let join = tokio::spawn(self.run(rx));
        SchedulerHandle { shutdown, join }
    }
}

/// Stop signal and join handle for a spawned scheduler
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop to stop and wait for it to exit
    pub async fn shutdown(self) {
        // The receiver is gone only if the task already ended
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            error!("Scheduler task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
