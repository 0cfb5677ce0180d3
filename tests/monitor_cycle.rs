//! End-to-end monitoring cycles with scripted ping and speedtest backends

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wan_monitor::app::build_scheduler;
use wan_monitor::latency::Pinger;
use wan_monitor::metrics::{BANDWIDTH_BPS, LATENCY_HIST_SECONDS, LATENCY_SECONDS, REACHABLE};
use wan_monitor::speedtest::{BandwidthMeter, SpeedtestServer};
use wan_monitor::{AppError, Config, MemorySink, PrometheusSink, Result};

struct ScriptedPinger {
    calls: AtomicUsize,
}

#[async_trait]
impl Pinger for ScriptedPinger {
    async fn ping(&self, host: &str, _count: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match host {
            "1.1.1.1" => Ok("time=23.4 ms\ntime=25.1 ms\n".to_string()),
            "8.8.8.8" => Err(AppError::ping("ping 8.8.8.8 exited with status 1")),
            _ => Ok(String::new()),
        }
    }
}

/// Meter whose first refresh fails, so the first speedtest selects on demand
struct FlakyMeter {
    refreshes: AtomicUsize,
    selected: Mutex<Option<SpeedtestServer>>,
}

impl FlakyMeter {
    fn server() -> SpeedtestServer {
        SpeedtestServer {
            url: "http://speed.example.net:8080/speedtest/upload.php".to_string(),
            name: "Amsterdam".to_string(),
            country: "Netherlands".to_string(),
            sponsor: "Example".to_string(),
            host: "speed.example.net:8080".to_string(),
        }
    }
}

#[async_trait]
impl BandwidthMeter for FlakyMeter {
    async fn refresh_servers(&self) -> Result<SpeedtestServer> {
        if self.refreshes.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(AppError::network("speedtest.net unreachable"));
        }
        let server = Self::server();
        *self.selected.lock() = Some(server.clone());
        Ok(server)
    }

    async fn measure_download(&self) -> Result<f64> {
        let unselected = self.selected.lock().is_none();
        if unselected {
            self.refresh_servers().await?;
        }
        Ok(120_000_000.0)
    }

    async fn measure_upload(&self) -> Result<f64> {
        Ok(20_000_000.0)
    }

    fn selected_server(&self) -> Option<SpeedtestServer> {
        self.selected.lock().clone()
    }
}

fn config() -> Config {
    let mut config = Config::default();
    config.interval_latency_secs = 10;
    config.ping_hosts = vec!["1.1.1.1".to_string(), "8.8.8.8".to_string(), "9.9.9.9".to_string()];
    config
}

fn backends() -> (Arc<ScriptedPinger>, Arc<FlakyMeter>) {
    (
        Arc::new(ScriptedPinger { calls: AtomicUsize::new(0) }),
        Arc::new(FlakyMeter {
            refreshes: AtomicUsize::new(0),
            selected: Mutex::new(None),
        }),
    )
}

#[tokio::test(start_paused = true)]
async fn test_cycle_populates_metrics() {
    let (pinger, meter) = backends();
    let sink = Arc::new(MemorySink::new());
    let mut scheduler = build_scheduler(&config(), sink.clone(), meter.clone(), pinger.clone());

    scheduler.run(tokio::time::sleep(Duration::from_millis(11_500))).await;

    // Two latency cycles over three hosts
    assert_eq!(pinger.calls.load(Ordering::SeqCst), 6);

    let one = [("server", "1.1.1.1")];
    assert!((sink.gauge(LATENCY_SECONDS, &one).unwrap() - 0.02425).abs() < 1e-9);
    assert_eq!(sink.observations(LATENCY_HIST_SECONDS, &one).len(), 4);
    assert_eq!(sink.gauge(REACHABLE, &one), Some(1.0));

    assert_eq!(sink.gauge(REACHABLE, &[("server", "8.8.8.8")]), Some(0.0));
    assert_eq!(sink.gauge(REACHABLE, &[("server", "9.9.9.9")]), None);

    // The failed refresh did not prevent the speedtest from running
    assert_eq!(meter.refreshes.load(Ordering::SeqCst), 2);
    assert_eq!(
        sink.gauge(BANDWIDTH_BPS, &[("dir", "download"), ("server", "speed.example.net:8080")]),
        Some(120_000_000.0)
    );
    assert_eq!(sink.series_count(BANDWIDTH_BPS), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cycle_renders_prometheus_text() {
    let (pinger, meter) = backends();
    let sink = Arc::new(PrometheusSink::new().unwrap());
    let mut scheduler = build_scheduler(&config(), sink.clone(), meter, pinger);

    scheduler.run(std::future::ready(())).await;

    let text = sink.render().unwrap();
    assert!(text.contains("wan_latency_seconds{server=\"1.1.1.1\"} 0.0242"));
    assert!(text.contains("wan_reachable{server=\"8.8.8.8\"} 0"));
    assert!(text.contains("wan_latency_hist_seconds_count{server=\"1.1.1.1\"} 2"));
    assert!(text.contains("wan_bandwidth_bps{dir=\"upload\",server=\"speed.example.net:8080\"} 20000000"));
    assert!(!text.contains("server=\"9.9.9.9\""));
}
