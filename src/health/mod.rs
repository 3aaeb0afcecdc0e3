//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Round timer
//!     → Failure window check per backend (resilience::backoff)
//!     → Resolve host (net::dns), GET <url><health path>
//!     → Join all probes of the round
//!     → Sleep one interval
//!
//! Outcomes (state.rs):
//!     200 → Healthy, anything else → Unhealthy
//!     → written into the load_balancer registry
//! ```
//!
//! # Design Decisions
//! - Liveness is inferred only from probes, never from live traffic
//! - A single probe result decides the state; no hysteresis
//! - Probe failures are local and silent; none is fatal to the process
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod state;
