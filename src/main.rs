//! WAN Monitor - Prometheus exporter for WAN bandwidth, latency and reachability

use clap::Parser;
use std::future::Future;
use std::process;
use tracing::{error, info};
use wan_monitor::{app::App, cli::Cli, config::load_config, logging::init_logging, Result};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }

    if let Err(e) = run(cli).await {
        error!(category = e.category(), "{}", e);
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli)?;

    // Signal streams are registered here, before the first iteration
    let shutdown = shutdown_signal()?;

    App::new(config).run(shutdown).await
}

#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()> + Send> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => {},
            _ = terminate.recv() => {},
        }
        info!("Interrupt received, stopping after the current iteration");
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()> + Send> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;

    Ok(async move {
        ctrl_c.recv().await;
        info!("Interrupt received, stopping after the current iteration");
    })
}
