//! Timeout enforcement.
//!
//! # Responsibilities
//! - Resolve the transport timeouts from config, applying fixed defaults
//! - Bound the wait for backend response headers, counted from the end of
//!   the request body
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - A timed-out forward is a transport failure and surfaces as 502

use std::future::Future;
use std::time::Duration;

use crate::config::ProxyConfig;

pub const DEFAULT_DIAL: Duration = Duration::from_secs(5);
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
pub const DEFAULT_TLS_HANDSHAKE: Duration = Duration::from_secs(5);
pub const DEFAULT_RESPONSE_HEADER: Duration = Duration::from_secs(5);
pub const DEFAULT_EXPECT_CONTINUE: Duration = Duration::from_secs(1);

/// Timeouts for the forwarding transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimeouts {
    /// TCP connect deadline.
    pub dial: Duration,
    /// TCP keep-alive probe interval on backend connections.
    pub keep_alive: Duration,
    /// Additional deadline for the TLS handshake after connect.
    pub tls_handshake: Duration,
    /// Deadline for response headers, counted once the request body is written.
    pub response_header: Duration,
    /// Longest to hold a request body waiting for `100 Continue`.
    ///
    /// Accepted for config compatibility and reported at startup, but it has
    /// no effect: hyper's client never waits for `100 Continue` and sends the
    /// body straight away.
    pub expect_continue: Duration,
}

impl Default for TransportTimeouts {
    fn default() -> Self {
        Self {
            dial: DEFAULT_DIAL,
            keep_alive: DEFAULT_KEEP_ALIVE,
            tls_handshake: DEFAULT_TLS_HANDSHAKE,
            response_header: DEFAULT_RESPONSE_HEADER,
            expect_continue: DEFAULT_EXPECT_CONTINUE,
        }
    }
}

fn secs_or(value: Option<u64>, default: Duration) -> Duration {
    match value {
        Some(secs) if secs > 0 => Duration::from_secs(secs),
        _ => default,
    }
}

impl TransportTimeouts {
    /// Take overrides from config; unset or zero values keep the default.
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            dial: secs_or(config.dial_timeout, DEFAULT_DIAL),
            keep_alive: secs_or(config.keep_alive, DEFAULT_KEEP_ALIVE),
            tls_handshake: secs_or(config.tls_handshake_timeout, DEFAULT_TLS_HANDSHAKE),
            response_header: secs_or(config.response_header_timeout, DEFAULT_RESPONSE_HEADER),
            expect_continue: secs_or(config.expect_continue_timeout, DEFAULT_EXPECT_CONTINUE),
        }
    }
}

/// Error returned when a deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {0:?} elapsed")]
pub struct DeadlineElapsed(pub Duration);

/// Run `fut`, failing if it is still pending `deadline` after `armed` resolves.
///
/// Nothing is timed until `armed` completes; its output is ignored.
pub async fn deadline_after<A, F>(
    armed: A,
    deadline: Duration,
    fut: F,
) -> Result<F::Output, DeadlineElapsed>
where
    A: Future,
    F: Future,
{
    let expiry = async {
        armed.await;
        tokio::time::sleep(deadline).await;
    };
    tokio::pin!(fut);
    tokio::pin!(expiry);

    tokio::select! {
        biased;
        output = &mut fut => Ok(output),
        _ = &mut expiry => Err(DeadlineElapsed(deadline)),
    }
}
