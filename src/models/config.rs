//! Configuration data model and validation

use crate::types::{AppError, Result};
use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// HTTP port the metrics endpoint listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds between speedtest runs
    #[serde(default = "default_interval_speedtest")]
    pub interval_speedtest_secs: u64,

    /// Seconds between latency checks
    #[serde(default = "default_interval_latency")]
    pub interval_latency_secs: u64,

    /// Seconds between best-server refreshes
    #[serde(default = "default_server_refresh_interval")]
    pub server_refresh_interval_secs: u64,

    /// Hosts pinged by the latency probe
    #[serde(default = "default_ping_hosts")]
    pub ping_hosts: Vec<String>,

    /// Echo requests sent to each host per cycle
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    /// speedtest.net server list endpoint
    #[serde(default = "default_speedtest_servers_url")]
    pub speedtest_servers_url: String,

    /// Enable verbose (debug) logging
    #[serde(default)]
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            interval_speedtest_secs: default_interval_speedtest(),
            interval_latency_secs: default_interval_latency(),
            server_refresh_interval_secs: default_server_refresh_interval(),
            ping_hosts: default_ping_hosts(),
            ping_count: default_ping_count(),
            speedtest_servers_url: default_speedtest_servers_url(),
            verbose: false,
        }
    }
}

impl Config {
    pub fn interval_speedtest(&self) -> Duration {
        Duration::from_secs(self.interval_speedtest_secs)
    }

    pub fn interval_latency(&self) -> Duration {
        Duration::from_secs(self.interval_latency_secs)
    }

    pub fn server_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.server_refresh_interval_secs)
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(AppError::config("Port must be greater than 0"));
        }

        for (name, value) in [
            ("Speedtest interval", self.interval_speedtest_secs),
            ("Latency interval", self.interval_latency_secs),
            ("Speedtest server refresh interval", self.server_refresh_interval_secs),
        ] {
            if value == 0 {
                return Err(AppError::config(format!("{} must be greater than 0", name)));
            }
        }

        if self.ping_hosts.is_empty() {
            return Err(AppError::config("At least one ping host is required"));
        }

        for host in &self.ping_hosts {
            if host.trim().is_empty() {
                return Err(AppError::config("Ping host cannot be empty"));
            }
            // Hosts are handed to the ping binary as a single argument
            if host.starts_with('-') || host.chars().any(char::is_whitespace) {
                return Err(AppError::config(format!("Invalid ping host: '{}'", host)));
            }
        }

        if self.ping_count == 0 {
            return Err(AppError::config("Ping count must be greater than 0"));
        }

        if self.ping_count > 100 {
            return Err(AppError::config("Ping count cannot exceed 100"));
        }

        match url::Url::parse(&self.speedtest_servers_url) {
            Ok(parsed) => {
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!(
                        "Speedtest servers URL must use HTTP or HTTPS: {}",
                        self.speedtest_servers_url
                    )));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!(
                    "Invalid speedtest servers URL '{}': {}",
                    self.speedtest_servers_url, e
                )));
            }
        }

        Ok(())
    }

    /// Merge `WAN_MONITOR_*` environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var("WAN_MONITOR_PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| AppError::config(format!("Invalid WAN_MONITOR_PORT value '{}': {}", port, e)))?;
        }

        if let Ok(value) = std::env::var("WAN_MONITOR_INTERVAL_SPEEDTEST") {
            self.interval_speedtest_secs = parse_secs("WAN_MONITOR_INTERVAL_SPEEDTEST", &value)?;
        }

        if let Ok(value) = std::env::var("WAN_MONITOR_INTERVAL_LATENCY") {
            self.interval_latency_secs = parse_secs("WAN_MONITOR_INTERVAL_LATENCY", &value)?;
        }

        if let Ok(value) = std::env::var("WAN_MONITOR_SERVER_REFRESH_INTERVAL") {
            self.server_refresh_interval_secs = parse_secs("WAN_MONITOR_SERVER_REFRESH_INTERVAL", &value)?;
        }

        if let Ok(hosts) = std::env::var("WAN_MONITOR_PING_HOSTS") {
            self.ping_hosts = hosts
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(count) = std::env::var("WAN_MONITOR_PING_COUNT") {
            self.ping_count = count
                .trim()
                .parse()
                .map_err(|e| AppError::config(format!("Invalid WAN_MONITOR_PING_COUNT value '{}': {}", count, e)))?;
        }

        if let Ok(url) = std::env::var("WAN_MONITOR_SPEEDTEST_SERVERS_URL") {
            self.speedtest_servers_url = url.trim().to_string();
        }

        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

// Default value functions for serde
fn default_port() -> u16 {
    crate::defaults::DEFAULT_PORT
}

fn default_interval_speedtest() -> u64 {
    crate::defaults::DEFAULT_INTERVAL_SPEEDTEST.as_secs()
}

fn default_interval_latency() -> u64 {
    crate::defaults::DEFAULT_INTERVAL_LATENCY.as_secs()
}

fn default_server_refresh_interval() -> u64 {
    crate::defaults::DEFAULT_SERVER_REFRESH_INTERVAL.as_secs()
}

fn default_ping_hosts() -> Vec<String> {
    crate::defaults::DEFAULT_PING_HOSTS
        .iter()
        .map(|&s| s.to_string())
        .collect()
}

fn default_ping_count() -> u32 {
    crate::defaults::DEFAULT_PING_COUNT
}

fn default_speedtest_servers_url() -> String {
    crate::defaults::DEFAULT_SPEEDTEST_SERVERS_URL.to_string()
}
