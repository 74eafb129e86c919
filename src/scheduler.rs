//! Timer-driven orchestration with failure isolation.
//!
//! Jobs are named; registering the same name twice is a no-op, so starting
//! the scheduler twice cannot double-register an interval. Each tick is
//! wrapped: a job error is logged and never crashes the process or blocks
//! later ticks. The first tick fires immediately, giving every job one run
//! shortly after startup.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Result type jobs return; errors are logged, never propagated.
pub type JobResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Drives named background jobs on fixed intervals.
#[derive(Default)]
pub struct Scheduler {
    jobs: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register and start a named interval job.
    ///
    /// Returns `false` (and does nothing) if a job with this name is already
    /// registered. Missed ticks are skipped, not queued.
    pub fn register<F>(&self, name: &str, every: Duration, run: F) -> bool
    where
        F: Fn() -> BoxFuture<'static, JobResult> + Send + Sync + 'static,
    {
        let mut jobs = self.jobs.lock().expect("scheduler lock");
        if jobs.contains_key(name) {
            warn!(job = name, "job already registered, ignoring");
            return false;
        }

        let job_name = name.to_string();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match run().await {
                    Ok(()) => debug!(job = %job_name, "job tick completed"),
                    Err(e) => error!(job = %job_name, "job tick failed: {}", e),
                }
            }
        });

        jobs.insert(name.to_string(), handle);
        true
    }

    /// Number of registered jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.lock().expect("scheduler lock").len()
    }

    /// Stop all jobs. Used by tests and shutdown paths.
    pub fn shutdown(&self) {
        let mut jobs = self.jobs.lock().expect("scheduler lock");
        for (_, handle) in jobs.drain() {
            handle.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
