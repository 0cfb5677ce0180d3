//! Main application orchestration

use crate::{
    bandwidth::{BandwidthProbe, ServerRefresh},
    config::display_config_summary,
    error::Result,
    latency::{LatencyProbe, Pinger, SystemPinger},
    metrics::{MetricsServer, MetricsSink, PrometheusSink},
    models::Config,
    scheduler::Scheduler,
    speedtest::{BandwidthMeter, SpeedtestClient, SpeedtestConfig},
};
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Wire the three periodic tasks to their collaborators
pub fn build_scheduler(
    config: &Config,
    sink: Arc<dyn MetricsSink>,
    meter: Arc<dyn BandwidthMeter>,
    pinger: Arc<dyn Pinger>,
) -> Scheduler {
    Scheduler::new(
        config,
        Box::new(ServerRefresh::new(Arc::clone(&meter))),
        Box::new(LatencyProbe::from_config(config, pinger, Arc::clone(&sink))),
        Box::new(BandwidthProbe::new(meter, sink)),
    )
}

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Serve metrics and run the probes until `shutdown` completes
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            version = crate::VERSION,
            commit = option_env!("GIT_COMMIT").unwrap_or("unknown"),
            built = option_env!("BUILD_TIME").unwrap_or("unknown"),
            "Starting {}",
            crate::PKG_NAME
        );
        for line in display_config_summary(&self.config).lines() {
            debug!("{}", line);
        }

        let registry = Arc::new(PrometheusSink::new()?);
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.config.port));
        let server = MetricsServer::bind(addr, Arc::clone(&registry)).await?;
        let server_task = tokio::spawn(async move {
            if let Err(e) = server.serve().await {
                error!(error = %e, "Metrics endpoint stopped");
            }
        });

        let meter: Arc<dyn BandwidthMeter> =
            Arc::new(SpeedtestClient::new(SpeedtestConfig::from_config(&self.config))?);
        let pinger: Arc<dyn Pinger> = Arc::new(SystemPinger::default());

        let mut scheduler = build_scheduler(&self.config, registry, meter, pinger);
        scheduler.run(shutdown).await;

        server_task.abort();
        info!("Shutting down");
        Ok(())
    }
}
