//! Periodic probe scheduling
//!
//! The scheduler owns three [`PeriodicTask`]s and evaluates them in a fixed
//! order on every iteration: server refresh, latency, speedtest. Each
//! iteration reads the clock once, fires the tasks whose interval has
//! strictly elapsed, then sleeps for [`POLL_INTERVAL`](crate::defaults::POLL_INTERVAL).
//! A failing probe is logged and retried at its next interval; it never stops
//! the loop or the probes after it.

pub mod task;

pub use task::PeriodicTask;

use crate::defaults::POLL_INTERVAL;
use crate::error::Result;
use crate::models::Config;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

pub const SERVER_REFRESH: &str = "server-refresh";
pub const LATENCY: &str = "latency";
pub const SPEEDTEST: &str = "speedtest";

/// One unit of periodic work
#[async_trait]
pub trait Probe: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Perform one measurement cycle
    async fn run(&self) -> Result<()>;
}

/// Cooperative loop driving the periodic tasks
#[derive(Debug)]
pub struct Scheduler {
    tasks: Vec<PeriodicTask>,
    poll_interval: Duration,
}

impl Scheduler {
    /// Build the standard schedule from the configured intervals
    pub fn new(
        config: &Config,
        server_refresh: Box<dyn Probe>,
        latency: Box<dyn Probe>,
        speedtest: Box<dyn Probe>,
    ) -> Self {
        Self::from_tasks(vec![
            PeriodicTask::new(SERVER_REFRESH, config.server_refresh_interval(), server_refresh),
            PeriodicTask::new(LATENCY, config.interval_latency(), latency),
            PeriodicTask::new(SPEEDTEST, config.interval_speedtest(), speedtest),
        ])
    }

    /// Build a schedule from arbitrary tasks, evaluated in the given order
    pub fn from_tasks(tasks: Vec<PeriodicTask>) -> Self {
        Self {
            tasks,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Override the sleep between iterations
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn tasks(&self) -> &[PeriodicTask] {
        &self.tasks
    }

    /// Run one iteration at `now`, returning the names of the tasks that fired
    pub async fn tick(&mut self, now: Instant) -> Vec<&'static str> {
        let mut fired = Vec::new();

        for task in &mut self.tasks {
            if !task.is_due(now) {
                continue;
            }

            debug!(task = task.name(), "Running periodic task");
            let started = Instant::now();
            match task.fire(now).await {
                Ok(()) => debug!(
                    task = task.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Periodic task finished"
                ),
                Err(e) => error!(
                    task = task.name(),
                    category = e.category(),
                    recoverable = e.is_recoverable(),
                    error = %e,
                    "Periodic task failed, retrying at next interval"
                ),
            }
            fired.push(task.name());
        }

        fired
    }

    /// Loop until `shutdown` completes.
    ///
    /// `shutdown` is only checked between iterations, so a probe that is
    /// already running finishes first.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            tasks = ?self.tasks.iter().map(PeriodicTask::name).collect::<Vec<_>>(),
            "Scheduler started"
        );

        loop {
            self.tick(Instant::now()).await;

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!("Scheduler stopped");
    }
}
