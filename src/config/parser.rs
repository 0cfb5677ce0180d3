//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, models::Config};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration.
    ///
    /// Precedence, lowest first: built-in defaults, `.env`, process
    /// environment, explicit command line flags.
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file()?;
        EnvManager::validate_current_env()?;
        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(port) = self.cli.port {
            config.port = port;
        }

        if let Some(secs) = self.cli.interval_speedtest {
            config.interval_speedtest_secs = secs;
        }

        if let Some(secs) = self.cli.interval_latency {
            config.interval_latency_secs = secs;
        }

        if let Some(secs) = self.cli.speedtest_server_refresh_interval {
            config.server_refresh_interval_secs = secs;
        }

        if !self.cli.ping_hosts.is_empty() {
            config.ping_hosts = self.cli.ping_hosts.clone();
        }

        if let Some(count) = self.cli.ping_count {
            config.ping_count = count;
        }

        if let Some(ref url) = self.cli.speedtest_servers_url {
            config.speedtest_servers_url = url.clone();
        }

        // CLI-only
        config.verbose = self.cli.verbose;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Configuration summary for debug logging
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Port: {}", config.port));
    summary.push(format!("Speedtest interval: {}s", config.interval_speedtest_secs));
    summary.push(format!("Latency interval: {}s", config.interval_latency_secs));
    summary.push(format!("Server refresh interval: {}s", config.server_refresh_interval_secs));
    summary.push(format!("Ping hosts: {}", config.ping_hosts.join(", ")));
    summary.push(format!("Ping count: {}", config.ping_count));
    summary.push(format!("Speedtest servers: {}", config.speedtest_servers_url));
    summary.push(format!("Verbose: {}", config.verbose));

    summary.join("\n")
}
