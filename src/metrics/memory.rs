//! In-memory metrics sink

use super::{check_labels, GaugeEntry, MetricsSink};
use crate::error::Result;
use crate::types::Labels;
use parking_lot::RwLock;
use std::collections::BTreeMap;

type SeriesKey = (String, Vec<(String, String)>);

/// Normalize a label set so lookups do not depend on label order
fn series_key(name: &str, labels: &[(&str, &str)]) -> SeriesKey {
    let mut pairs: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    pairs.sort();
    (name.to_string(), pairs)
}

#[derive(Debug, Default)]
struct Store {
    gauges: BTreeMap<SeriesKey, f64>,
    observations: BTreeMap<SeriesKey, Vec<f64>>,
}

/// Metrics sink that keeps every value in memory.
///
/// Records raw observations instead of bucketing them, which makes it
/// convenient for asserting on probe output.
#[derive(Debug, Default)]
pub struct MemorySink {
    store: RwLock<Store>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a gauge series
    pub fn gauge(&self, name: &str, labels: Labels<'_>) -> Option<f64> {
        self.store.read().gauges.get(&series_key(name, labels)).copied()
    }

    /// All values observed by a histogram series, in recording order
    pub fn observations(&self, name: &str, labels: Labels<'_>) -> Vec<f64> {
        self.store
            .read()
            .observations
            .get(&series_key(name, labels))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of gauge series currently present for `name`
    pub fn series_count(&self, name: &str) -> usize {
        self.store
            .read()
            .gauges
            .keys()
            .filter(|(series, _)| series == name)
            .count()
    }

    /// True when nothing has been recorded at all
    pub fn is_empty(&self) -> bool {
        let store = self.store.read();
        store.gauges.is_empty() && store.observations.is_empty()
    }
}

impl MetricsSink for MemorySink {
    fn set_gauge(&self, name: &str, labels: Labels<'_>, value: f64) -> Result<()> {
        check_labels(name, labels)?;
        self.store.write().gauges.insert(series_key(name, labels), value);
        Ok(())
    }

    fn observe(&self, name: &str, labels: Labels<'_>, value: f64) -> Result<()> {
        check_labels(name, labels)?;
        self.store
            .write()
            .observations
            .entry(series_key(name, labels))
            .or_default()
            .push(value);
        Ok(())
    }

    fn replace_all(&self, name: &str, entries: &[GaugeEntry]) -> Result<()> {
        let mut keyed = Vec::with_capacity(entries.len());
        for entry in entries {
            let labels = entry.label_pairs();
            check_labels(name, &labels)?;
            keyed.push((series_key(name, &labels), entry.value));
        }

        let mut store = self.store.write();
        store.gauges.retain(|(series, _), _| series != name);
        store.gauges.extend(keyed);
        Ok(())
    }
}
