//! Observability subsystem.
//!
//! ```text
//! prober, dispatcher, server
//!     → logging.rs  tracing events → stdout (fmt layer, EnvFilter)
//!     → metrics.rs  request/probe counters, health gauges → Prometheus scrape
//! ```
//!
//! Metrics recording is a no-op until the exporter is installed, so the
//! rest of the crate records unconditionally.

pub mod logging;
pub mod metrics;
