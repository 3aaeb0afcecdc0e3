//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single configured origin server
//! - Hold its health flag, readable on the request path without blocking
//! - Record when it last passed and last failed a probe
//! - Remember the address its host last resolved to

use arc_swap::ArcSwapOption;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// An `Option<Instant>` that can be updated through a shared reference.
///
/// Stored as nanoseconds past a fixed epoch, plus one so that zero means
/// "never".
#[derive(Debug)]
pub struct AtomicStamp {
    epoch: Instant,
    nanos: AtomicU64,
}

impl AtomicStamp {
    pub fn new(epoch: Instant) -> Self {
        Self {
            epoch,
            nanos: AtomicU64::new(0),
        }
    }

    pub fn store(&self, at: Instant) {
        let offset = at.saturating_duration_since(self.epoch).as_nanos();
        let encoded = u64::try_from(offset).unwrap_or(u64::MAX - 1) + 1;
        self.nanos.store(encoded, Ordering::Release);
    }

    pub fn load(&self) -> Option<Instant> {
        match self.nanos.load(Ordering::Acquire) {
            0 => None,
            n => Some(self.epoch + std::time::Duration::from_nanos(n - 1)),
        }
    }
}

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// Position in the configured backend list.
    pub index: usize,
    /// Base URL (scheme, host, optional port and base path).
    pub url: Url,
    /// Hostname extracted from `url`.
    pub host: String,

    healthy: AtomicBool,
    last_success: AtomicStamp,
    last_failure: AtomicStamp,
    resolved_ip: ArcSwapOption<IpAddr>,
}

impl Backend {
    /// Create a backend in the unhealthy state.
    pub fn new(index: usize, url: Url, epoch: Instant) -> Self {
        let host = url.host_str().unwrap_or_default().to_string();
        Self {
            index,
            url,
            host,
            healthy: AtomicBool::new(false),
            last_success: AtomicStamp::new(epoch),
            last_failure: AtomicStamp::new(epoch),
            resolved_ip: ArcSwapOption::empty(),
        }
    }

    /// Whether the latest applicable probe succeeded.
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Set the health flag, returning the previous value.
    pub fn set_healthy(&self, healthy: bool) -> bool {
        self.healthy.swap(healthy, Ordering::AcqRel)
    }

    pub fn record_success(&self, at: Instant) {
        self.last_success.store(at);
    }

    pub fn record_failure(&self, at: Instant) {
        self.last_failure.store(at);
    }

    pub fn last_success(&self) -> Option<Instant> {
        self.last_success.load()
    }

    pub fn last_failure(&self) -> Option<Instant> {
        self.last_failure.load()
    }

    /// Address the host last resolved to.
    pub fn resolved_ip(&self) -> Option<IpAddr> {
        self.resolved_ip.load().as_deref().copied()
    }

    /// Store the latest resolution; `None` clears it after a failed lookup.
    pub fn set_resolved_ip(&self, ip: Option<IpAddr>) {
        self.resolved_ip.store(ip.map(Arc::new));
    }
}
