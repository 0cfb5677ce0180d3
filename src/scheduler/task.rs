//! A probe paired with its schedule

use super::Probe;
use crate::error::Result;
use std::time::Duration;
use tokio::time::Instant;

/// Schedule entry for one periodic activity
pub struct PeriodicTask {
    name: &'static str,
    interval: Duration,
    last_run: Option<Instant>,
    probe: Box<dyn Probe>,
}

impl PeriodicTask {
    pub fn new(name: &'static str, interval: Duration, probe: Box<dyn Probe>) -> Self {
        Self {
            name,
            interval,
            last_run: None,
            probe,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the task last fired, `None` if it never has
    pub fn last_run(&self) -> Option<Instant> {
        self.last_run
    }

    /// A task is due when it never ran or strictly more than `interval`
    /// has passed since it last fired.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.interval,
        }
    }

    /// Run the probe and stamp the task with `now`, whatever the outcome
    pub async fn fire(&mut self, now: Instant) -> Result<()> {
        let result = self.probe.run().await;
        self.last_run = Some(now);
        result
    }
}

impl std::fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("last_run", &self.last_run)
            .field("probe", &self.probe.name())
            .finish()
    }
}
