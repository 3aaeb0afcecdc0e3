//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Pick the level from config, the verbose switch, or `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over everything else when set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(log_level: &str, verbose: bool) -> String {
    if verbose {
        "health_proxy=debug,tower_http=debug".to_string()
    } else {
        format!("health_proxy={0},tower_http={0}", log_level)
    }
}

/// Install the global tracing subscriber.
pub fn init(log_level: &str, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level, verbose)));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
    if let Err(e) = installed {
        eprintln!("logging already initialised: {}", e);
    }
}
