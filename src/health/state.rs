//! Probe outcomes and how they land in the registry.
//!
//! # State Transitions
//! ```text
//! any → Healthy:   probe answered 200
//! any → Unhealthy: DNS failure, transport error, timeout, non-200 status
//! unchanged:       backend skipped by the failure backoff window
//! ```

use axum::http::StatusCode;
use std::fmt;
use std::time::Instant;

use crate::load_balancer::registry::Registry;
use crate::observability::metrics;

/// Result of probing one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The health endpoint answered 200.
    Healthy,
    /// Host resolution failed.
    ResolveFailed(String),
    /// Connect, TLS or protocol failure.
    TransportError(String),
    /// No response within the probe timeout.
    TimedOut,
    /// The health endpoint answered with something other than 200.
    BadStatus(StatusCode),
    /// Inside the failure backoff window; not probed this round.
    Skipped,
}

impl ProbeOutcome {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Healthy => "healthy",
            ProbeOutcome::ResolveFailed(_) => "resolve_failed",
            ProbeOutcome::TransportError(_) => "transport_error",
            ProbeOutcome::TimedOut => "timeout",
            ProbeOutcome::BadStatus(_) => "bad_status",
            ProbeOutcome::Skipped => "skipped",
        }
    }

    /// Write this outcome for backend `index`, stamped with the round's `now`.
    pub fn apply(&self, registry: &Registry, index: usize, now: Instant) {
        let Some(backend) = registry.get(index) else {
            return;
        };

        match self {
            ProbeOutcome::Skipped => return,
            ProbeOutcome::Healthy => {
                backend.record_success(now);
                if registry.mark_healthy(index) {
                    tracing::info!(backend = %backend.url, index, "Backend is healthy");
                }
            }
            failure => {
                backend.record_failure(now);
                if registry.mark_unhealthy(index) {
                    tracing::warn!(backend = %backend.url, index, reason = %failure, "Backend is unhealthy");
                }
            }
        }

        metrics::record_backend_health(backend.url.as_str(), backend.is_healthy());
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Healthy => write!(f, "healthy"),
            ProbeOutcome::ResolveFailed(e) => write!(f, "resolution failed: {}", e),
            ProbeOutcome::TransportError(e) => write!(f, "transport error: {}", e),
            ProbeOutcome::TimedOut => write!(f, "timed out"),
            ProbeOutcome::BadStatus(status) => write!(f, "status code {}", status),
            ProbeOutcome::Skipped => write!(f, "skipped (failure window)"),
        }
    }
}
