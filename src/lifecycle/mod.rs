//! Process lifecycle.
//!
//! ```text
//! main.rs:     load config → build server → bind → serve
//! signals.rs:  SIGINT / SIGTERM → Shutdown::trigger
//! shutdown.rs: broadcast → monitor loop exits, server drains and stops
//! ```
//!
//! Config errors are fatal before anything listens; nothing after startup is.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
