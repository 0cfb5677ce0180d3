//! Measurement server descriptions and selection

use crate::error::{AppError, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Score given to a latency request that failed or returned garbage
pub const LATENCY_PENALTY: Duration = Duration::from_secs(3600);

/// One entry of the speedtest.net server list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeedtestServer {
    /// Upload endpoint, e.g. `http://host:8080/speedtest/upload.php`
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub sponsor: String,
    /// `host:port`, used as the `server` label
    pub host: String,
}

impl SpeedtestServer {
    /// Resolve a file living next to the upload endpoint
    pub fn resource(&self, file: &str) -> Result<Url> {
        Ok(Url::parse(&self.url)?.join(file)?)
    }

    pub fn upload_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.url)?)
    }
}

impl std::fmt::Display for SpeedtestServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {}) [{}]", self.sponsor, self.name, self.country, self.host)
    }
}

/// Mean of the latency scores, in seconds
pub fn mean_latency(scores: &[Duration]) -> f64 {
    if scores.is_empty() {
        return LATENCY_PENALTY.as_secs_f64();
    }
    scores.iter().map(Duration::as_secs_f64).sum::<f64>() / scores.len() as f64
}

/// Pick the server with the lowest mean latency.
///
/// Fails when there are no candidates or every candidate only collected
/// penalties.
pub fn pick_best(scored: Vec<(SpeedtestServer, f64)>) -> Result<(SpeedtestServer, f64)> {
    let best = scored
        .into_iter()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| AppError::speedtest("No candidate servers to choose from"))?;

    if best.1 >= LATENCY_PENALTY.as_secs_f64() {
        return Err(AppError::speedtest("No candidate server answered the latency test"));
    }

    Ok(best)
}
