//! Failure backoff window for health probes.
//!
//! A backend that failed a probe less than `window` ago is skipped for the
//! round and keeps its current state. A zero window re-probes every round.

use std::time::{Duration, Instant};

use crate::load_balancer::backend::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FailureBackoff {
    window: Duration,
}

impl FailureBackoff {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether a failure recorded at `last_failure` still suppresses probing at `now`.
    pub fn in_window(&self, last_failure: Option<Instant>, now: Instant) -> bool {
        if self.window.is_zero() {
            return false;
        }
        match last_failure {
            Some(at) => now.saturating_duration_since(at) < self.window,
            None => false,
        }
    }

    /// Whether `backend` should sit out the round evaluated at `now`.
    pub fn should_skip(&self, backend: &Backend, now: Instant) -> bool {
        self.in_window(backend.last_failure(), now)
    }
}
