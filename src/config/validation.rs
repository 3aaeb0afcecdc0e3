//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate backend URLs (scheme, host)
//! - Validate value ranges (probe timeout shorter than interval)
//! - Reject credentials that cannot travel in an HTTP header
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderValue;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,

    #[error("backend {index}: invalid url {url:?}: {reason}")]
    InvalidBackendUrl {
        index: usize,
        url: String,
        reason: String,
    },

    #[error("health path {0:?} must start with '/'")]
    InvalidHealthPath(String),

    #[error("probe timeout {timeout_ms}ms must be shorter than the {interval_secs}s interval")]
    ProbeTimeoutTooLong { timeout_ms: u64, interval_secs: u64 },

    #[error("bearer token contains characters not allowed in an HTTP header")]
    InvalidBearerToken,

    #[error("metrics address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a backend URL and return it parsed.
pub fn parse_backend_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme {:?}", other)),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(url)
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    for (index, backend) in config.backends.iter().enumerate() {
        if let Err(reason) = parse_backend_url(&backend.url) {
            errors.push(ValidationError::InvalidBackendUrl {
                index,
                url: backend.url.clone(),
                reason,
            });
        }
    }

    if !config.health.starts_with('/') {
        errors.push(ValidationError::InvalidHealthPath(config.health.clone()));
    }

    let timeout = config.probe_timeout();
    if timeout >= config.interval() {
        errors.push(ValidationError::ProbeTimeoutTooLong {
            timeout_ms: timeout.as_millis() as u64,
            interval_secs: config.interval,
        });
    }

    if let Some(token) = &config.bearer_token {
        if HeaderValue::from_str(&format!("Bearer {}", token)).is_err() {
            errors.push(ValidationError::InvalidBearerToken);
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
