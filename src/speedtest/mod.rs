//! Bandwidth measurement against speedtest.net servers
//!
//! [`BandwidthMeter`] is the seam used by the bandwidth probe and the server
//! refresh task; [`SpeedtestClient`] implements it over HTTP with the
//! speedtest.net protocol (server list, `latency.txt`, `random*.jpg`
//! downloads and `upload.php` uploads).

pub mod client;
pub mod servers;

pub use client::SpeedtestClient;
pub use servers::SpeedtestServer;

use crate::error::Result;
use crate::models::Config;
use async_trait::async_trait;
use std::time::Duration;

/// Measures WAN throughput against a selected measurement server
#[async_trait]
pub trait BandwidthMeter: Send + Sync {
    /// Re-fetch the server list, select the best server and remember it
    async fn refresh_servers(&self) -> Result<SpeedtestServer>;

    /// Download throughput in bits per second.
    /// Selects a server first if none has been selected yet.
    async fn measure_download(&self) -> Result<f64>;

    /// Upload throughput in bits per second.
    /// Selects a server first if none has been selected yet.
    async fn measure_upload(&self) -> Result<f64>;

    /// Server currently used for measurements
    fn selected_server(&self) -> Option<SpeedtestServer>;
}

/// Tuning of the speedtest protocol
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedtestConfig {
    /// JSON endpoint listing nearby servers
    pub servers_url: String,
    /// Timeout applied to every HTTP request
    pub timeout: Duration,
    /// How many servers from the head of the list are latency-tested
    pub candidate_count: usize,
    /// `latency.txt` requests per candidate
    pub latency_samples: usize,
    /// Edge lengths of the `random{N}x{N}.jpg` images to download
    pub download_sizes: Vec<u32>,
    /// Upload payload sizes, in bytes
    pub upload_sizes: Vec<usize>,
    /// Requests issued per download or upload size
    pub requests_per_size: usize,
    /// Transfers in flight at once
    pub concurrency: usize,
    /// Wall-clock budget of one download or upload measurement
    pub test_duration: Duration,
}

impl Default for SpeedtestConfig {
    fn default() -> Self {
        Self {
            servers_url: crate::defaults::DEFAULT_SPEEDTEST_SERVERS_URL.to_string(),
            timeout: Duration::from_secs(30),
            candidate_count: 5,
            latency_samples: 3,
            download_sizes: vec![350, 500, 750, 1000, 1500, 2000],
            upload_sizes: vec![32_768, 65_536, 131_072, 262_144, 524_288, 1_048_576],
            requests_per_size: 4,
            concurrency: 4,
            test_duration: Duration::from_secs(10),
        }
    }
}

impl SpeedtestConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            servers_url: config.speedtest_servers_url.clone(),
            ..Self::default()
        }
    }
}
