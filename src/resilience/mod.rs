//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Probe round:
//!     → backoff.rs (skip backends inside their failure window)
//!
//! Request to backend:
//!     → timeouts.rs (dial, TLS handshake, response header deadlines)
//!     → On failure: 502 to the client, no retry within the request
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retrying is the client's choice; a fresh request gets a fresh pick
//! - Failure backoff keeps known-bad endpoints from being hammered

pub mod backoff;
pub mod timeouts;
