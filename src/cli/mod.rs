//! Command-line interface

use clap::{ArgAction, Parser};

/// WAN monitor, ready to scrape via Prometheus
#[derive(Parser, Debug, Clone)]
#[command(name = "wan-monitor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbose log output
    #[arg(short, long)]
    pub verbose: bool,

    /// Where to listen [default: 26543]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Interval (in seconds) of speed test [default: 600]
    #[arg(long, value_parser = parse_interval)]
    pub interval_speedtest: Option<u64>,

    /// Interval (in seconds) of latency test [default: 10]
    #[arg(long, value_parser = parse_interval)]
    pub interval_latency: Option<u64>,

    /// How frequently (in seconds) the best speedtest server should be refreshed [default: 3600]
    #[arg(long, value_parser = parse_interval)]
    pub speedtest_server_refresh_interval: Option<u64>,

    /// Host to ping for latency checks (can be used multiple times) [default: 1.1.1.1, 8.8.8.8]
    #[arg(long = "ping-host", action = ArgAction::Append)]
    pub ping_hosts: Vec<String>,

    /// Echo requests sent to each host per latency check [default: 4]
    #[arg(long)]
    pub ping_count: Option<u32>,

    /// speedtest.net server list endpoint
    #[arg(long)]
    pub speedtest_servers_url: Option<String>,
}

/// Parse an interval given in whole seconds
fn parse_interval(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid interval: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid interval: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Interval must be greater than 0".to_string())
            } else {
                Ok(secs)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing_defaults() {
        let cli = Cli::parse_from(["wan-monitor"]);
        assert!(!cli.verbose);
        assert_eq!(cli.port, None);
        assert_eq!(cli.interval_speedtest, None);
        assert_eq!(cli.interval_latency, None);
        assert_eq!(cli.speedtest_server_refresh_interval, None);
        assert!(cli.ping_hosts.is_empty());
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "wan-monitor",
            "-v",
            "-p", "9100",
            "--interval-speedtest", "1800",
            "--interval-latency", "30",
            "--speedtest-server-refresh-interval", "7200",
            "--ping-host", "9.9.9.9",
            "--ping-host", "1.0.0.1",
            "--ping-count", "8",
            "--speedtest-servers-url", "http://127.0.0.1:8080/servers",
        ]);

        assert!(cli.verbose);
        assert_eq!(cli.port, Some(9100));
        assert_eq!(cli.interval_speedtest, Some(1800));
        assert_eq!(cli.interval_latency, Some(30));
        assert_eq!(cli.speedtest_server_refresh_interval, Some(7200));
        assert_eq!(cli.ping_hosts, vec!["9.9.9.9", "1.0.0.1"]);
        assert_eq!(cli.ping_count, Some(8));
        assert_eq!(cli.speedtest_servers_url.as_deref(), Some("http://127.0.0.1:8080/servers"));
    }

    #[test]
    fn test_long_flags() {
        let cli = Cli::parse_from(["wan-monitor", "--verbose", "--port", "26544"]);
        assert!(cli.verbose);
        assert_eq!(cli.port, Some(26544));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Cli::try_parse_from(["wan-monitor", "--interval-latency", "0"]).is_err());
        assert!(Cli::try_parse_from(["wan-monitor", "--interval-latency", "abc"]).is_err());
        assert!(Cli::try_parse_from(["wan-monitor", "--port", "70000"]).is_err());
    }

    #[test]
    fn test_interval_parsing() {
        assert_eq!(parse_interval("1").unwrap(), 1);
        assert_eq!(parse_interval("600").unwrap(), 600);
        assert!(parse_interval("0").is_err());
        assert!(parse_interval("-5").is_err());
        assert!(parse_interval("+10").is_err());
        assert!(parse_interval("0x10").is_err());
        assert!(parse_interval("10.5").is_err());
        assert!(parse_interval("").is_err());
    }
}
