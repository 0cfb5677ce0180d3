//! Bandwidth probe and measurement-server refresh task

use crate::error::{AppError, Result};
use crate::metrics::{GaugeEntry, MetricsSink, BANDWIDTH_BPS};
use crate::models::BandwidthResult;
use crate::scheduler::Probe;
use crate::speedtest::BandwidthMeter;
use crate::types::Direction;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Measures download then upload throughput and publishes both
pub struct BandwidthProbe {
    meter: Arc<dyn BandwidthMeter>,
    sink: Arc<dyn MetricsSink>,
}

impl BandwidthProbe {
    pub fn new(meter: Arc<dyn BandwidthMeter>, sink: Arc<dyn MetricsSink>) -> Self {
        Self { meter, sink }
    }

    /// Run both measurements against the selected server
    pub async fn measure(&self) -> Result<BandwidthResult> {
        let download_bps = self.meter.measure_download().await?;
        let upload_bps = self.meter.measure_upload().await?;

        let server = self
            .meter
            .selected_server()
            .ok_or_else(|| AppError::speedtest("Measurement finished without a selected server"))?;

        Ok(BandwidthResult::new(server.host, download_bps, upload_bps))
    }

    /// Replace the bandwidth gauge so only the latest server remains
    pub fn publish(&self, result: &BandwidthResult) -> Result<()> {
        let entries: Vec<GaugeEntry> = [Direction::Upload, Direction::Download]
            .into_iter()
            .map(|dir| {
                GaugeEntry::new(
                    [("dir", dir.as_str()), ("server", result.server.as_str())],
                    result.bps(dir),
                )
            })
            .collect();

        self.sink.replace_all(BANDWIDTH_BPS, &entries)
    }
}

#[async_trait]
impl Probe for BandwidthProbe {
    fn name(&self) -> &'static str {
        "speedtest"
    }

    async fn run(&self) -> Result<()> {
        let result = self.measure().await?;
        self.publish(&result)?;

        info!(
            server = %result.server,
            download_mbps = result.mbps(Direction::Download),
            upload_mbps = result.mbps(Direction::Upload),
            "Bandwidth measured"
        );
        Ok(())
    }
}

/// Re-selects the measurement server used by [`BandwidthProbe`]
pub struct ServerRefresh {
    meter: Arc<dyn BandwidthMeter>,
}

impl ServerRefresh {
    pub fn new(meter: Arc<dyn BandwidthMeter>) -> Self {
        Self { meter }
    }
}

#[async_trait]
impl Probe for ServerRefresh {
    fn name(&self) -> &'static str {
        "server-refresh"
    }

    async fn run(&self) -> Result<()> {
        let server = self.meter.refresh_servers().await?;
        info!(server = %server.host, sponsor = %server.sponsor, "Speedtest server refreshed");
        Ok(())
    }
}
