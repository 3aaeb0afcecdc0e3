//! Configuration.
//!
//! ```text
//! backend.yml (or *.toml)
//!     → loader.rs      read, deserialize, zero values → defaults
//!     → validation.rs  URLs, health path, probe timeout, token, metrics address
//!     → ProxyConfig    read-only from here on
//! ```
//!
//! Backend membership is fixed at load. Runtime health lives in the
//! load balancer's registry, never in the config.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{BackendConfig, ObservabilityConfig, ProxyConfig};
