//! Metrics sink and Prometheus exposition
//!
//! Probes never touch a registry directly; they write through the
//! [`MetricsSink`] trait, which is injected into them at construction.
//!
//! - [`PrometheusSink`]: backed by a `prometheus::Registry`, rendered by the
//!   HTTP endpoint in [`server`]
//! - [`MemorySink`]: plain in-memory store, handy for tests and embedding
//!
//! Exposed series (names and labels are a compatibility surface):
//!
//! | name | type | labels |
//! |---|---|---|
//! | `wan_bandwidth_bps` | gauge | `dir`, `server` |
//! | `wan_latency_hist_seconds` | histogram | `server` |
//! | `wan_latency_seconds` | gauge | `server` |
//! | `wan_reachable` | gauge | `server` |

pub mod memory;
pub mod registry;
pub mod server;

pub use memory::MemorySink;
pub use registry::PrometheusSink;
pub use server::MetricsServer;

use crate::error::{AppError, Result};
use crate::types::Labels;

pub const BANDWIDTH_BPS: &str = "wan_bandwidth_bps";
pub const LATENCY_HIST_SECONDS: &str = "wan_latency_hist_seconds";
pub const LATENCY_SECONDS: &str = "wan_latency_seconds";
pub const REACHABLE: &str = "wan_reachable";

/// Histogram buckets for latency observations, in seconds.
/// Same bounds as the default buckets of the official Prometheus clients.
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Histogram,
}

/// Static description of a metric family
#[derive(Debug, Clone, Copy)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
}

/// Every metric family exported by the monitor
pub const WAN_METRICS: &[MetricDesc] = &[
    MetricDesc {
        name: BANDWIDTH_BPS,
        help: "Available bandwidth, in bits per second",
        kind: MetricKind::Gauge,
        labels: &["dir", "server"],
    },
    MetricDesc {
        name: LATENCY_HIST_SECONDS,
        help: "Latency to the measurement servers, histogram mode",
        kind: MetricKind::Histogram,
        labels: &["server"],
    },
    MetricDesc {
        name: LATENCY_SECONDS,
        help: "Current latency to the measurement servers",
        kind: MetricKind::Gauge,
        labels: &["server"],
    },
    MetricDesc {
        name: REACHABLE,
        help: "Indicates whether the given server is reachable or not",
        kind: MetricKind::Gauge,
        labels: &["server"],
    },
];

/// One series of a gauge: its label set and value
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeEntry {
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl GaugeEntry {
    pub fn new<I, K, V>(labels: I, value: f64) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            value,
        }
    }

    /// Borrowed view of the labels
    pub fn label_pairs(&self) -> Vec<(&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

/// Destination for probe results.
///
/// Implementations are shared between the scheduler and the scrape path, so
/// every method takes `&self`.
pub trait MetricsSink: Send + Sync {
    /// Set the gauge series identified by `labels` to `value`
    fn set_gauge(&self, name: &str, labels: Labels<'_>, value: f64) -> Result<()>;

    /// Record one observation into the histogram series identified by `labels`
    fn observe(&self, name: &str, labels: Labels<'_>, value: f64) -> Result<()>;

    /// Replace every series of gauge `name` with exactly `entries`.
    ///
    /// Atomic with respect to readers: a concurrent read sees either the
    /// previous set of series or the new one, never an empty metric in
    /// between. If any entry is invalid nothing is changed.
    fn replace_all(&self, name: &str, entries: &[GaugeEntry]) -> Result<()>;
}

/// Look up a metric description by name
pub fn describe(name: &str) -> Option<&'static MetricDesc> {
    WAN_METRICS.iter().find(|desc| desc.name == name)
}

/// Check a label set against the declared label names of `name`.
/// Names without a description accept any label set.
pub(crate) fn check_labels(name: &str, labels: &[(&str, &str)]) -> Result<()> {
    let Some(desc) = describe(name) else {
        return Ok(());
    };

    let matches = labels.len() == desc.labels.len()
        && desc.labels.iter().all(|declared| labels.iter().any(|(k, _)| k == declared));

    if matches {
        Ok(())
    } else {
        Err(AppError::metrics(format!(
            "Label set {:?} does not match {} labels {:?}",
            labels.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            name,
            desc.labels
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_known_metrics() {
        let bandwidth = describe(BANDWIDTH_BPS).unwrap();
        assert_eq!(bandwidth.kind, MetricKind::Gauge);
        assert_eq!(bandwidth.labels, &["dir", "server"]);

        let hist = describe(LATENCY_HIST_SECONDS).unwrap();
        assert_eq!(hist.kind, MetricKind::Histogram);

        assert!(describe("wan_unknown").is_none());
    }

    #[test]
    fn test_check_labels() {
        assert!(check_labels(REACHABLE, &[("server", "1.1.1.1")]).is_ok());
        assert!(check_labels(BANDWIDTH_BPS, &[("server", "a"), ("dir", "upload")]).is_ok());
        assert!(check_labels(BANDWIDTH_BPS, &[("dir", "upload")]).is_err());
        assert!(check_labels(REACHABLE, &[("host", "1.1.1.1")]).is_err());
        assert!(check_labels("custom_metric", &[("anything", "x")]).is_ok());
    }

    #[test]
    fn test_buckets_sorted() {
        assert!(LATENCY_BUCKETS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_gauge_entry_labels() {
        let entry = GaugeEntry::new([("dir", "upload"), ("server", "example.net:8080")], 1.5);
        assert_eq!(entry.label_pairs(), vec![("dir", "upload"), ("server", "example.net:8080")]);
        assert_eq!(entry.value, 1.5);
    }
}
