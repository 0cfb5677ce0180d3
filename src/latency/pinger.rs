//! ICMP echo through the system `ping` binary

use crate::defaults::DEFAULT_PING_SPACING;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Sends a batch of echo requests to a host
#[async_trait]
pub trait Pinger: Send + Sync {
    /// Ping `host` `count` times and return the tool's textual output.
    /// Fails when the tool cannot be started or reports failure.
    async fn ping(&self, host: &str, count: u32) -> Result<String>;
}

/// Pinger backed by the operating system's `ping` command
#[derive(Debug, Clone)]
pub struct SystemPinger {
    program: String,
    spacing: Duration,
}

impl Default for SystemPinger {
    fn default() -> Self {
        Self::new(DEFAULT_PING_SPACING)
    }
}

impl SystemPinger {
    pub fn new(spacing: Duration) -> Self {
        Self {
            program: "ping".to_string(),
            spacing,
        }
    }

    /// Run `program` instead of `ping`, with the same arguments
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Command line for the current platform
    pub fn args(&self, host: &str, count: u32) -> Vec<String> {
        if cfg!(windows) {
            vec!["-n".to_string(), count.to_string(), host.to_string()]
        } else {
            vec![
                "-c".to_string(),
                count.to_string(),
                "-i".to_string(),
                format!("{:.1}", self.spacing.as_secs_f64()),
                host.to_string(),
            ]
        }
    }
}

#[async_trait]
impl Pinger for SystemPinger {
    async fn ping(&self, host: &str, count: u32) -> Result<String> {
        let args = self.args(host, count);
        debug!(host, program = %self.program, ?args, "Invoking ping");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::ping(format!("Failed to run ping for {}: {}", host, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::ping(format!(
                "{} {} exited with {}: {}",
                self.program,
                host,
                output.status,
                stderr.trim()
            )));
        }

        Ok(stdout)
    }
}
