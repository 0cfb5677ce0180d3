//! Latency and bandwidth measurement data models

use crate::types::Direction;

/// Round-trip samples collected for one host in one latency cycle
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyStats {
    /// Individual round-trip times, in seconds
    pub samples: Vec<f64>,

    /// Arithmetic mean of `samples`, in seconds
    pub mean: f64,

    /// Fastest sample, in seconds
    pub min: f64,

    /// Slowest sample, in seconds
    pub max: f64,
}

impl LatencyStats {
    /// Aggregate samples; `None` when there is nothing to aggregate
    pub fn from_samples(samples: Vec<f64>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self { samples, mean, min, max })
    }

    /// Number of samples
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// Mean latency in milliseconds, for logging
    pub fn mean_ms(&self) -> f64 {
        self.mean * 1000.0
    }
}

/// Outcome of one speedtest run
#[derive(Debug, Clone, PartialEq)]
pub struct BandwidthResult {
    /// Host identifier of the measurement server (`host:port`)
    pub server: String,

    /// Upload throughput, bits per second
    pub upload_bps: f64,

    /// Download throughput, bits per second
    pub download_bps: f64,
}

impl BandwidthResult {
    pub fn new(server: impl Into<String>, download_bps: f64, upload_bps: f64) -> Self {
        Self {
            server: server.into(),
            upload_bps,
            download_bps,
        }
    }

    /// Throughput for one direction
    pub fn bps(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Upload => self.upload_bps,
            Direction::Download => self.download_bps,
        }
    }

    /// Throughput in megabits per second, for logging
    pub fn mbps(&self, direction: Direction) -> f64 {
        self.bps(direction) / 1_000_000.0
    }
}
