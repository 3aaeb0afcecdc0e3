//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Health prober
//!     → registry.rs (mark_healthy / mark_unhealthy per backend)
//!
//! Inbound request
//!     → LoadBalancer::next_server
//!     → registry.rs (snapshot of healthy indices)
//!     → random.rs (uniform pick among them)
//!     → backend.rs (chosen backend, or NoHealthyBackends)
//! ```
//!
//! # Design Decisions
//! - Selection is stateless; the registry is the only shared state
//! - Unhealthy backends excluded from selection
//! - No weighting or affinity: a fresh random draw per request

pub mod backend;
pub mod random;
pub mod registry;

use std::sync::Arc;

use self::backend::Backend;
use self::registry::Registry;

/// Error returned when no backend can take the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("no healthy backends available")]
    NoHealthyBackends,
}

/// A backend selection strategy.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Choose a backend among those currently healthy.
    fn next_server(&self, registry: &Registry) -> Result<Arc<Backend>, SelectError>;
}
