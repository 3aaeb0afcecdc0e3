//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.
//! Durations are whole seconds unless the key says otherwise; a zero
//! duration means "unset" and falls back to the built-in default.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_HEALTH_PATH: &str = "/health";
pub const DEFAULT_DNS_TIMEOUT_MS: u64 = 500;

/// Upper bound for the default probe timeout.
const MAX_DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listen port for inbound client traffic.
    pub port: u16,

    /// Seconds between the end of one probe round and the start of the next.
    pub interval: u64,

    /// Health endpoint path, shared by all backends.
    pub health: String,

    /// Credential injected as `Authorization: Bearer <token>` on probes and
    /// proxied requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,

    pub dial_timeout: Option<u64>,
    pub keep_alive: Option<u64>,
    pub tls_handshake_timeout: Option<u64>,
    pub response_header_timeout: Option<u64>,
    /// Accepted and logged only; hyper's client sends request bodies without
    /// waiting for `100 Continue`, so this never takes effect.
    pub expect_continue_timeout: Option<u64>,

    /// Seconds a backend is left alone after a failed probe. Zero re-probes
    /// failed backends on every round.
    pub failure_window: u64,

    /// Per-probe deadline. Defaults to half the interval, capped at 5s.
    pub probe_timeout_ms: Option<u64>,

    /// Deadline for a single DNS lookup.
    pub dns_timeout_ms: u64,

    /// Ordered backend list; indices are stable for the process lifetime.
    pub backends: Vec<BackendConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            interval: DEFAULT_INTERVAL_SECS,
            health: DEFAULT_HEALTH_PATH.to_string(),
            bearer_token: None,
            dial_timeout: None,
            keep_alive: None,
            tls_handshake_timeout: None,
            response_header_timeout: None,
            expect_continue_timeout: None,
            failure_window: 0,
            probe_timeout_ms: None,
            dns_timeout_ms: DEFAULT_DNS_TIMEOUT_MS,
            backends: Vec::new(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Replace zero/empty values with their defaults.
    ///
    /// Config files written for older deployments use `0` and `""` to mean
    /// "not set", so this runs once after deserialization.
    pub fn apply_defaults(&mut self) {
        if self.port == 0 {
            self.port = DEFAULT_PORT;
        }
        if self.interval == 0 {
            self.interval = DEFAULT_INTERVAL_SECS;
        }
        if self.health.is_empty() {
            self.health = DEFAULT_HEALTH_PATH.to_string();
        }
        if self.dns_timeout_ms == 0 {
            self.dns_timeout_ms = DEFAULT_DNS_TIMEOUT_MS;
        }
        if self.bearer_token.as_deref() == Some("") {
            self.bearer_token = None;
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn failure_window(&self) -> Duration {
        Duration::from_secs(self.failure_window)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }

    /// Effective per-probe deadline.
    pub fn probe_timeout(&self) -> Duration {
        match self.probe_timeout_ms {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => {
                let half = self.interval.saturating_mul(1_000) / 2;
                Duration::from_millis(half.min(MAX_DEFAULT_PROBE_TIMEOUT_MS))
            }
        }
    }

    /// Socket address the proxy listens on.
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base address: scheme, host and optional port.
    pub url: String,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let mut config = ProxyConfig {
            port: 0,
            interval: 0,
            health: String::new(),
            bearer_token: Some(String::new()),
            ..ProxyConfig::default()
        };
        config.apply_defaults();

        assert_eq!(config.port, 80);
        assert_eq!(config.interval, 3);
        assert_eq!(config.health, "/health");
        assert!(config.bearer_token.is_none());
    }

    #[test]
    fn probe_timeout_is_shorter_than_interval() {
        let config = ProxyConfig::default();
        assert_eq!(config.probe_timeout(), Duration::from_millis(1_500));

        let slow = ProxyConfig { interval: 60, ..ProxyConfig::default() };
        assert_eq!(slow.probe_timeout(), Duration::from_secs(5));

        let explicit = ProxyConfig { probe_timeout_ms: Some(250), ..ProxyConfig::default() };
        assert_eq!(explicit.probe_timeout(), Duration::from_millis(250));
    }
}
