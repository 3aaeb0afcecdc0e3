//! Health-aware HTTP load-balancing reverse proxy.
//!
//! Requests are forwarded to a uniformly random backend among those whose
//! latest health probe succeeded. Probing runs in the background, one round
//! per interval, and is the only thing that changes backend health.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
