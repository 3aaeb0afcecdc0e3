//! Backend registry.
//!
//! # Responsibilities
//! - Own one health record per configured backend, in config order
//! - Expose per-index health reads and writes
//! - Produce the healthy set for selection
//!
//! # Design Decisions
//! - One atomic flag per backend; no registry-wide lock, so slow probes
//!   never stall the request path
//! - The snapshot reads each flag once; it may interleave with concurrent
//!   writes, staleness is bounded by one probe interval
//! - Membership is fixed at construction

use std::sync::Arc;
use std::time::Instant;

use crate::config::BackendConfig;
use crate::config::validation::parse_backend_url;
use crate::load_balancer::backend::Backend;

/// Error type for registry construction.
#[derive(Debug, thiserror::Error)]
#[error("backend {index}: invalid url {url:?}: {reason}")]
pub struct RegistryError {
    pub index: usize,
    pub url: String,
    pub reason: String,
}

/// Health state for every configured backend.
#[derive(Debug)]
pub struct Registry {
    backends: Vec<Arc<Backend>>,
}

impl Registry {
    /// Build the registry from configuration. Every backend starts unhealthy.
    pub fn new(configs: &[BackendConfig]) -> Result<Self, RegistryError> {
        let epoch = Instant::now();
        let backends = configs
            .iter()
            .enumerate()
            .map(|(index, config)| {
                parse_backend_url(&config.url)
                    .map(|url| Arc::new(Backend::new(index, url, epoch)))
                    .map_err(|reason| RegistryError {
                        index,
                        url: config.url.clone(),
                        reason,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { backends })
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Backend>> {
        self.backends.get(index)
    }

    /// All backends, in config order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Mark backend `index` healthy. Returns true if this changed its state.
    pub fn mark_healthy(&self, index: usize) -> bool {
        self.set(index, true)
    }

    /// Mark backend `index` unhealthy. Returns true if this changed its state.
    pub fn mark_unhealthy(&self, index: usize) -> bool {
        self.set(index, false)
    }

    fn set(&self, index: usize, healthy: bool) -> bool {
        match self.backends.get(index) {
            Some(backend) => backend.set_healthy(healthy) != healthy,
            None => false,
        }
    }

    /// Health of backend `index`; unknown indices are unhealthy.
    pub fn is_healthy(&self, index: usize) -> bool {
        self.backends
            .get(index)
            .map(|b| b.is_healthy())
            .unwrap_or(false)
    }

    /// Indices of currently healthy backends, ascending.
    pub fn healthy_indices(&self) -> Vec<usize> {
        self.backends
            .iter()
            .filter(|b| b.is_healthy())
            .map(|b| b.index)
            .collect()
    }
}
