//! Latency and reachability probe
//!
//! Each cycle pings every configured host and updates, per host:
//!
//! - `wan_latency_hist_seconds`: one observation per round-trip sample
//! - `wan_latency_seconds`: mean of the cycle's samples
//! - `wan_reachable`: 1 when samples were collected, 0 when ping failed
//!
//! When ping succeeds but no sample can be used, all three are left as they
//! were.

pub mod pinger;

pub use pinger::{Pinger, SystemPinger};

use crate::error::{ErrorContext, Result};
use crate::metrics::{MetricsSink, LATENCY_HIST_SECONDS, LATENCY_SECONDS, REACHABLE};
use crate::models::{Config, LatencyStats};
use crate::scheduler::Probe;
use crate::types::HostStatus;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};

fn ping_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)time=([0-9][0-9.]*)\s*ms").expect("valid ping time regex"))
}

/// Extract round-trip times, in seconds, from ping output
pub fn parse_ping_times(output: &str) -> Result<Vec<f64>> {
    ping_time_regex()
        .captures_iter(output)
        .map(|caps| {
            let token = &caps[1];
            token
                .parse::<f64>()
                .map(|ms| ms / 1000.0)
                .with_context(|| format!("Invalid ping time '{}'", token))
        })
        .collect()
}

/// Probe measuring latency to a fixed list of hosts
pub struct LatencyProbe {
    hosts: Vec<String>,
    count: u32,
    pinger: Arc<dyn Pinger>,
    sink: Arc<dyn MetricsSink>,
}

impl LatencyProbe {
    pub fn new(hosts: Vec<String>, count: u32, pinger: Arc<dyn Pinger>, sink: Arc<dyn MetricsSink>) -> Self {
        Self {
            hosts,
            count,
            pinger,
            sink,
        }
    }

    pub fn from_config(config: &Config, pinger: Arc<dyn Pinger>, sink: Arc<dyn MetricsSink>) -> Self {
        Self::new(config.ping_hosts.clone(), config.ping_count, pinger, sink)
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Ping one host and record the outcome.
    ///
    /// Only a failed write to the sink is returned as an error; ping and
    /// parse problems are logged and reported through the status.
    pub async fn check_host(&self, host: &str) -> Result<HostStatus> {
        let labels = [("server", host)];

        let output = match self.pinger.ping(host, self.count).await {
            Ok(output) => output,
            Err(e) => {
                error!(host, error = %e, "Could not ping host");
                return self.settle(host, HostStatus::Unreachable);
            }
        };

        let samples = match parse_ping_times(&output) {
            Ok(samples) => samples,
            Err(e) => {
                error!(host, error = %e, output = %output, "Could not parse ping times");
                return self.settle(host, HostStatus::ParseFailed);
            }
        };

        let Some(stats) = LatencyStats::from_samples(samples) else {
            warn!(host, output = %output, "No ping times could be extracted");
            return self.settle(host, HostStatus::NoSamples);
        };

        for sample in &stats.samples {
            self.sink.observe(LATENCY_HIST_SECONDS, &labels, *sample)?;
        }
        self.sink.set_gauge(LATENCY_SECONDS, &labels, stats.mean)?;

        info!(
            host,
            samples = stats.count(),
            mean_ms = stats.mean_ms(),
            min_ms = stats.min * 1000.0,
            max_ms = stats.max * 1000.0,
            "Latency measured"
        );

        self.settle(
            host,
            HostStatus::Reachable {
                samples: stats.count(),
                mean_seconds: stats.mean,
            },
        )
    }

    /// Write the reachability implied by `status`, if any
    fn settle(&self, host: &str, status: HostStatus) -> Result<HostStatus> {
        if let Some(value) = status.reachability() {
            self.sink.set_gauge(REACHABLE, &[("server", host)], value)?;
        }
        Ok(status)
    }
}

#[async_trait]
impl Probe for LatencyProbe {
    fn name(&self) -> &'static str {
        "latency"
    }

    async fn run(&self) -> Result<()> {
        let mut last_err = None;

        for host in &self.hosts {
            match self.check_host(host).await {
                Ok(status) => debug!(host = %host, ?status, "Host checked"),
                Err(e) => {
                    error!(host = %host, error = %e, "Failed to record latency metrics");
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::metrics::MemorySink;
    use std::collections::HashMap;

    const LINUX_OUTPUT: &str = "\
PING 1.1.1.1 (1.1.1.1) 56(84) bytes of data.
64 bytes from 1.1.1.1: icmp_seq=1 ttl=57 time=12.3 ms
64 bytes from 1.1.1.1: icmp_seq=2 ttl=57 time=11.9 ms
64 bytes from 1.1.1.1: icmp_seq=3 ttl=57 time=13.0 ms
64 bytes from 1.1.1.1: icmp_seq=4 ttl=57 time=12.8 ms

--- 1.1.1.1 ping statistics ---
4 packets transmitted, 4 received, 0% packet loss, time 603ms
rtt min/avg/max/mdev = 11.900/12.500/13.000/0.424 ms
";

    /// Scripted pinger: each host maps to either output or a failure
    struct FakePinger {
        replies: HashMap<String, std::result::Result<String, String>>,
    }

    impl FakePinger {
        fn new() -> Self {
            Self { replies: HashMap::new() }
        }

        fn reply(mut self, host: &str, output: &str) -> Self {
            self.replies.insert(host.to_string(), Ok(output.to_string()));
            self
        }

        fn fail(mut self, host: &str) -> Self {
            self.replies.insert(host.to_string(), Err("100% packet loss".to_string()));
            self
        }
    }

    #[async_trait]
    impl Pinger for FakePinger {
        async fn ping(&self, host: &str, _count: u32) -> Result<String> {
            match self.replies.get(host) {
                Some(Ok(output)) => Ok(output.clone()),
                Some(Err(msg)) => Err(AppError::ping(msg.clone())),
                None => Err(AppError::ping(format!("unknown host {}", host))),
            }
        }
    }

    fn probe(hosts: &[&str], pinger: FakePinger) -> (LatencyProbe, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let probe = LatencyProbe::new(
            hosts.iter().map(|h| h.to_string()).collect(),
            4,
            Arc::new(pinger),
            sink.clone(),
        );
        (probe, sink)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_linux_output() {
        let times = parse_ping_times(LINUX_OUTPUT).unwrap();
        assert_eq!(times.len(), 4);
        assert!(approx(times[0], 0.0123));
        assert!(approx(times[3], 0.0128));
    }

    #[test]
    fn test_parse_variants() {
        let times = parse_ping_times("time=5 ms time=7.25ms TIME=1.5 MS").unwrap();
        assert_eq!(times.len(), 3);
        assert!(approx(times[0], 0.005));
        assert!(approx(times[1], 0.00725));
        assert!(approx(times[2], 0.0015));

        assert!(parse_ping_times("Request timed out.").unwrap().is_empty());
        assert!(parse_ping_times("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_token() {
        let err = parse_ping_times("time=1.2.3 ms").unwrap_err();
        assert_eq!(err.category(), "PARSE");
        assert!(err.to_string().contains("Invalid ping time '1.2.3'"));
    }

    #[tokio::test]
    async fn test_samples_update_all_metrics() {
        let (probe, sink) = probe(&["1.1.1.1"], FakePinger::new().reply("1.1.1.1", "time=23.4 ms time=25.1 ms"));

        let status = probe.check_host("1.1.1.1").await.unwrap();
        assert!(matches!(status, HostStatus::Reachable { samples: 2, .. }));

        let labels = [("server", "1.1.1.1")];
        let mean = sink.gauge(LATENCY_SECONDS, &labels).unwrap();
        assert!(approx(mean, 0.02425));

        let observed = sink.observations(LATENCY_HIST_SECONDS, &labels);
        assert_eq!(observed.len(), 2);
        assert!(approx(observed[0], 0.0234));
        assert!(approx(observed[1], 0.0251));

        assert_eq!(sink.gauge(REACHABLE, &labels), Some(1.0));
    }

    #[tokio::test]
    async fn test_no_samples_leaves_metrics_untouched() {
        let (probe, sink) = probe(&["8.8.8.8"], FakePinger::new().reply("8.8.8.8", "PING 8.8.8.8\n"));

        assert_eq!(probe.check_host("8.8.8.8").await.unwrap(), HostStatus::NoSamples);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_no_samples_keeps_previous_reachability() {
        let (probe, sink) = probe(&["8.8.8.8"], FakePinger::new().reply("8.8.8.8", "nothing useful"));
        sink.set_gauge(REACHABLE, &[("server", "8.8.8.8")], 1.0).unwrap();

        probe.run().await.unwrap();
        assert_eq!(sink.gauge(REACHABLE, &[("server", "8.8.8.8")]), Some(1.0));
    }

    #[tokio::test]
    async fn test_parse_failure_leaves_metrics_untouched() {
        let (probe, sink) = probe(&["8.8.8.8"], FakePinger::new().reply("8.8.8.8", "time=1.2.3 ms"));

        assert_eq!(probe.check_host("8.8.8.8").await.unwrap(), HostStatus::ParseFailed);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_ping_failure_marks_unreachable() {
        let (probe, sink) = probe(&["10.255.255.1"], FakePinger::new().fail("10.255.255.1"));

        assert_eq!(probe.check_host("10.255.255.1").await.unwrap(), HostStatus::Unreachable);
        assert_eq!(sink.gauge(REACHABLE, &[("server", "10.255.255.1")]), Some(0.0));
        assert_eq!(sink.gauge(LATENCY_SECONDS, &[("server", "10.255.255.1")]), None);
    }

    #[tokio::test]
    async fn test_hosts_are_independent() {
        let pinger = FakePinger::new()
            .fail("1.1.1.1")
            .reply("8.8.8.8", LINUX_OUTPUT);
        let (probe, sink) = probe(&["1.1.1.1", "8.8.8.8"], pinger);

        probe.run().await.unwrap();

        assert_eq!(sink.gauge(REACHABLE, &[("server", "1.1.1.1")]), Some(0.0));
        assert_eq!(sink.gauge(REACHABLE, &[("server", "8.8.8.8")]), Some(1.0));
        assert_eq!(sink.observations(LATENCY_HIST_SECONDS, &[("server", "8.8.8.8")]).len(), 4);
        let mean = sink.gauge(LATENCY_SECONDS, &[("server", "8.8.8.8")]).unwrap();
        assert!(approx(mean, 0.0125));
    }

    #[test]
    fn test_from_config() {
        let config = Config::default();
        let probe = LatencyProbe::from_config(&config, Arc::new(FakePinger::new()), Arc::new(MemorySink::new()));
        assert_eq!(probe.hosts(), &["1.1.1.1".to_string(), "8.8.8.8".to_string()]);
        assert_eq!(probe.name(), "latency");
    }
}
