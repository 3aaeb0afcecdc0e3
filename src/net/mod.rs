//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call (probe or proxied request)
//!     → connector.rs (bounded connect + TLS handshake)
//!     → dns.rs (cached hostname → IPv4 address)
//!     → TCP connect to the cached address
//! ```
//!
//! # Design Decisions
//! - One DNS cache per process, shared by prober and dispatcher
//! - Cache entries never expire
//! - HTTPS backends keep their hostname for SNI and certificate checks;
//!   only the TCP destination comes from the cache

pub mod connector;
pub mod dns;
