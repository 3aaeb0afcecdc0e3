//! Uniform random load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::Backend, registry::Registry, LoadBalancer, SelectError};

/// Picks uniformly among healthy backends with a fresh draw per call.
#[derive(Debug, Default)]
pub struct RandomSelector;

impl RandomSelector {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RandomSelector {
    fn next_server(&self, registry: &Registry) -> Result<Arc<Backend>, SelectError> {
        let healthy = registry.healthy_indices();
        if healthy.is_empty() {
            return Err(SelectError::NoHealthyBackends);
        }

        let index = healthy[fastrand::usize(..healthy.len())];
        registry
            .get(index)
            .cloned()
            .ok_or(SelectError::NoHealthyBackends)
    }
}
