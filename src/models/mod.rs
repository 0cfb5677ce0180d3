//! Data models and structures for the WAN monitor

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::Config;
pub use metrics::{BandwidthResult, LatencyStats};
