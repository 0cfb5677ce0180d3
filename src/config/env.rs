//! Environment variable handling and .env file management

use crate::error::{AppError, ErrorContext, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load `.env` from the working directory if it exists.
    ///
    /// Returns whether a file was loaded. Variables already present in the
    /// process environment are not overwritten.
    pub fn load_env_file() -> Result<bool> {
        Self::load_env_file_from(Path::new(".env"))
    }

    /// Load a specific env file if it exists
    pub fn load_env_file_from(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        dotenv::from_path(path).with_context(|| format!("Failed to load {}", path.display()))?;

        Ok(true)
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "WAN_MONITOR_PORT" => {
                let port: u16 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if port == 0 {
                    return Err(AppError::config(format!("{} must be greater than 0", key)));
                }
            }
            "WAN_MONITOR_INTERVAL_SPEEDTEST"
            | "WAN_MONITOR_INTERVAL_LATENCY"
            | "WAN_MONITOR_SERVER_REFRESH_INTERVAL" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if secs == 0 {
                    return Err(AppError::config(format!("{} must be greater than 0", key)));
                }
            }
            "WAN_MONITOR_PING_COUNT" => {
                let count: u32 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if count == 0 || count > 100 {
                    return Err(AppError::config(format!("{} must be between 1 and 100, got: {}", key, count)));
                }
            }
            "WAN_MONITOR_SPEEDTEST_SERVERS_URL" => {
                url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            _ => {
                // Unknown or free-form variable, nothing to check
            }
        }

        Ok(())
    }

    /// Supported environment variables with descriptions and examples
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("WAN_MONITOR_PORT", "Metrics HTTP port", "26543"),
            ("WAN_MONITOR_INTERVAL_SPEEDTEST", "Seconds between speed tests", "600"),
            ("WAN_MONITOR_INTERVAL_LATENCY", "Seconds between latency checks", "10"),
            ("WAN_MONITOR_SERVER_REFRESH_INTERVAL", "Seconds between best-server refreshes", "3600"),
            ("WAN_MONITOR_PING_HOSTS", "Comma-separated hosts to ping", "1.1.1.1,8.8.8.8"),
            ("WAN_MONITOR_PING_COUNT", "Echo requests per host per check (1-100)", "4"),
            (
                "WAN_MONITOR_SPEEDTEST_SERVERS_URL",
                "speedtest.net server list endpoint",
                "https://www.speedtest.net/api/js/servers?engine=js&limit=10",
            ),
        ]
    }

    /// Validate all currently set `WAN_MONITOR_*` variables
    pub fn validate_current_env() -> Result<()> {
        for (var_name, _, _) in Self::get_supported_env_vars() {
            if let Ok(value) = std::env::var(var_name) {
                Self::validate_env_var(var_name, value.trim())?;
            }
        }

        Ok(())
    }
}
