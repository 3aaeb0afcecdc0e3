//! Health-aware load-balancing reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ load_balancer ──▶ net client ──▶ Backend
//!                                        (random over          (cached DNS,
//!                                         healthy set)          timeouts)
//!                                             ▲
//!                                             │ health flags
//!                                      health monitor ──▶ GET <backend>/<health>
//!                                      (one round per interval)
//! ```
//!
//! Configuration is read once at startup; a bad file exits non-zero before
//! anything listens.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;

use health_proxy::config::load_config;
use health_proxy::lifecycle::{signals, Shutdown};
use health_proxy::observability::{logging, metrics};
use health_proxy::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "health-proxy")]
#[command(about = "HTTP load balancer that only routes to healthy backends", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file (YAML, or TOML by extension)
    #[arg(short, long, default_value = "backend.yml")]
    config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability.log_level, cli.verbose);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        port = config.port,
        backends = config.backends.len(),
        interval_secs = config.interval,
        health = %config.health,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.bind_address();
    let server = match HttpServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build server");
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %bind_address, error = %e, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Arc::new(Shutdown::new());
    let receiver = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move { signals::trigger_on_signal(&shutdown).await }
    });

    if let Err(e) = server.run(listener, receiver).await {
        tracing::error!(error = %e, "Server terminated with error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
