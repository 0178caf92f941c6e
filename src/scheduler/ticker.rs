// ==========================================
// Interval ticker with single-instance guard
// ==========================================
// A recurring trigger that invokes a job at a fixed
// period. At most one instance of a given job runs at
// a time: a tick firing while the previous run is
// still active is skipped, not queued. The guard is an
// explicit running flag shared between the interval
// loop and any manual triggers (e.g. the startup run).
// ==========================================

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// A unit of recurring work.
#[async_trait]
pub trait ScheduledJob: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// One complete run. Must handle its own failures; nothing it
    /// returns can stop the scheduler.
    async fn run(&self);
}

/// Wraps a job with the single-in-flight guard.
pub struct JobRunner {
    job: Arc<dyn ScheduledJob>,
    running: AtomicBool,
}

impl JobRunner {
    pub fn new(job: Arc<dyn ScheduledJob>) -> Self {
        Self {
            job,
            running: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &'static str {
        self.job.name()
    }

    /// Run the job unless an instance is already in flight.
    /// Returns true when the job actually ran.
    pub async fn trigger(&self) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(job = self.job.name(), "previous run still active, skipping tick");
            return false;
        }
        self.job.run().await;
        self.running.store(false, Ordering::SeqCst);
        true
    }
}

/// Spawn the interval loop for a job.
///
/// The loop stops accepting ticks when the shutdown channel flips;
/// an in-flight run completes before the task exits.
pub fn spawn_interval_job(
    runner: Arc<JobRunner>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Consume the immediate first tick; the startup run is
        // triggered explicitly by the caller.
        interval.tick().await;

        info!(job = runner.name(), period_seconds = period.as_secs(), "job scheduled");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    runner.trigger().await;
                }
                _ = shutdown.changed() => {
                    info!(job = runner.name(), "scheduler stopping");
                    break;
                }
            }
        }
    })
}
