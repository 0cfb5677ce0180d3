//! Log output configuration
//!
//! Installs a `tracing` subscriber printing lines of the form
//! `2026-01-01 12:00:00  INFO wan_monitor::latency: message key=value`.
//! Verbose mode lowers the level to `debug` and adds the source file and line.
//! `RUST_LOG` takes precedence over both.

use crate::error::{AppError, Result};
use tracing_subscriber::{fmt, fmt::time::ChronoLocal, EnvFilter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default filter directive for the given verbosity
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Build the filter, letting `RUST_LOG` override the verbosity flag
pub fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(verbose: bool) -> Result<()> {
    fmt()
        .with_env_filter(build_filter(verbose))
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .try_init()
        .map_err(|e| AppError::internal(format!("Failed to initialize logging: {}", e)))
}
