//! Type definitions and aliases

use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Label set of a single series, as `(name, value)` pairs
pub type Labels<'a> = &'a [(&'a str, &'a str)];

/// Direction of a bandwidth measurement, exported as the `dir` label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Upload,
    Download,
}

impl Direction {
    /// Label value used in `wan_bandwidth_bps{dir=...}`
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Upload => "upload",
            Direction::Download => "download",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of probing a single host in one latency cycle
#[derive(Debug, Clone, PartialEq)]
pub enum HostStatus {
    /// At least one round-trip sample was extracted
    Reachable { samples: usize, mean_seconds: f64 },
    /// Ping succeeded but its output carried no usable time tokens
    NoSamples,
    /// A time token could not be converted to a number
    ParseFailed,
    /// The ping invocation itself failed
    Unreachable,
}

impl HostStatus {
    /// Reachability gauge value written for this outcome, `None` leaves it untouched
    pub fn reachability(&self) -> Option<f64> {
        match self {
            HostStatus::Reachable { .. } => Some(1.0),
            HostStatus::Unreachable => Some(0.0),
            HostStatus::NoSamples | HostStatus::ParseFailed => None,
        }
    }
}
