//! Prometheus-backed metrics sink

use super::{check_labels, GaugeEntry, MetricDesc, MetricKind, MetricsSink, LATENCY_BUCKETS, WAN_METRICS};
use crate::error::{AppError, Result};
use crate::types::Labels;
use parking_lot::RwLock;
use prometheus::{GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;

/// Metrics sink that owns a dedicated `prometheus::Registry`.
///
/// Scrapes go through [`PrometheusSink::render`], which holds the read side
/// of `exposition` while gathering. [`MetricsSink::replace_all`] holds the
/// write side across its reset-then-set sequence, so a scrape can never
/// observe a gauge that was cleared but not yet repopulated.
pub struct PrometheusSink {
    registry: Registry,
    gauges: HashMap<&'static str, GaugeVec>,
    histograms: HashMap<&'static str, HistogramVec>,
    exposition: RwLock<()>,
}

impl PrometheusSink {
    /// Create a sink exporting the WAN monitor metric families
    pub fn new() -> Result<Self> {
        Self::with_metrics(WAN_METRICS)
    }

    /// Create a sink exporting the given metric families
    pub fn with_metrics(descs: &[MetricDesc]) -> Result<Self> {
        let registry = Registry::new();
        let mut gauges = HashMap::new();
        let mut histograms = HashMap::new();

        for desc in descs {
            match desc.kind {
                MetricKind::Gauge => {
                    let vec = GaugeVec::new(Opts::new(desc.name, desc.help), desc.labels)?;
                    registry.register(Box::new(vec.clone()))?;
                    gauges.insert(desc.name, vec);
                }
                MetricKind::Histogram => {
                    let opts = HistogramOpts::new(desc.name, desc.help).buckets(LATENCY_BUCKETS.to_vec());
                    let vec = HistogramVec::new(opts, desc.labels)?;
                    registry.register(Box::new(vec.clone()))?;
                    histograms.insert(desc.name, vec);
                }
            }
        }

        Ok(Self {
            registry,
            gauges,
            histograms,
            exposition: RwLock::new(()),
        })
    }

    /// Render all metric families in the Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let _guard = self.exposition.read();
        let families = self.registry.gather();
        TextEncoder::new()
            .encode_to_string(&families)
            .map_err(AppError::from)
    }

    /// Underlying registry, e.g. to register additional collectors
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn gauge_vec(&self, name: &str) -> Result<&GaugeVec> {
        self.gauges
            .get(name)
            .ok_or_else(|| AppError::metrics(format!("Unknown gauge: {}", name)))
    }

    fn histogram_vec(&self, name: &str) -> Result<&HistogramVec> {
        self.histograms
            .get(name)
            .ok_or_else(|| AppError::metrics(format!("Unknown histogram: {}", name)))
    }
}

fn label_map<'a>(labels: Labels<'a>) -> HashMap<&'a str, &'a str> {
    labels.iter().copied().collect()
}

impl MetricsSink for PrometheusSink {
    fn set_gauge(&self, name: &str, labels: Labels<'_>, value: f64) -> Result<()> {
        let gauge = self.gauge_vec(name)?.get_metric_with(&label_map(labels))?;
        gauge.set(value);
        Ok(())
    }

    fn observe(&self, name: &str, labels: Labels<'_>, value: f64) -> Result<()> {
        let histogram = self.histogram_vec(name)?.get_metric_with(&label_map(labels))?;
        histogram.observe(value);
        Ok(())
    }

    fn replace_all(&self, name: &str, entries: &[GaugeEntry]) -> Result<()> {
        let vec = self.gauge_vec(name)?;

        let label_sets: Vec<Vec<(&str, &str)>> = entries.iter().map(GaugeEntry::label_pairs).collect();
        for labels in &label_sets {
            check_labels(name, labels)?;
        }

        let _guard = self.exposition.write();
        vec.reset();
        for (labels, entry) in label_sets.iter().zip(entries) {
            vec.get_metric_with(&label_map(labels))?.set(entry.value);
        }

        Ok(())
    }
}
