//! WAN Monitor
//!
//! Periodically measures WAN connectivity quality (bandwidth through a
//! speedtest.net measurement, latency and reachability through ICMP echo to a
//! fixed set of hosts) and exposes the results as Prometheus metrics.

pub mod app;
pub mod bandwidth;
pub mod cli;
pub mod config;
pub mod error;
pub mod latency;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod scheduler;
pub mod speedtest;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use metrics::{MemorySink, MetricsSink, PrometheusSink};
pub use models::{BandwidthResult, Config, LatencyStats};
pub use scheduler::{PeriodicTask, Probe, Scheduler};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_PORT: u16 = 26543;
    pub const DEFAULT_INTERVAL_SPEEDTEST: Duration = Duration::from_secs(600);
    pub const DEFAULT_INTERVAL_LATENCY: Duration = Duration::from_secs(10);
    pub const DEFAULT_SERVER_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);
    pub const DEFAULT_PING_HOSTS: &[&str] = &[
        "1.1.1.1", // Cloudflare DNS
        "8.8.8.8", // Google DNS
    ];
    pub const DEFAULT_PING_COUNT: u32 = 4;
    pub const DEFAULT_PING_SPACING: Duration = Duration::from_millis(200);
    pub const DEFAULT_SPEEDTEST_SERVERS_URL: &str =
        "https://www.speedtest.net/api/js/servers?engine=js&limit=10";
    /// Scheduler polling granularity
    pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
}
