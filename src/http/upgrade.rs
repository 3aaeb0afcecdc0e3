//! Protocol upgrade passthrough (WebSocket and anything else behind `101`).
//!
//! # Data Flow
//! ```text
//! Client ──Upgrade──→ Proxy ──Upgrade──→ Backend
//! Client ←── 101 ───  Proxy ←── 101 ───  Backend
//! Client ←──── raw bytes ────→ Proxy ←──── raw bytes ────→ Backend
//! ```
//!
//! # Design Decisions
//! - Bytes are spliced as-is; frames are never parsed
//! - The spliced connection outlives the request and never touches health

use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;
use tokio::io::copy_bidirectional;

/// Join the client and backend connections once both have switched protocols.
///
/// Runs detached; the 101 response must still be returned to the client for
/// the client side to complete.
pub fn splice(client: OnUpgrade, backend: OnUpgrade, target: String) {
    tokio::spawn(async move {
        let (client, backend) = match tokio::try_join!(client, backend) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(backend = %target, error = %e, "Upgrade handshake failed");
                return;
            }
        };

        let mut client = TokioIo::new(client);
        let mut backend = TokioIo::new(backend);
        match copy_bidirectional(&mut client, &mut backend).await {
            Ok((up, down)) => tracing::debug!(
                backend = %target,
                bytes_up = up,
                bytes_down = down,
                "Upgraded connection closed"
            ),
            Err(e) => tracing::debug!(backend = %target, error = %e, "Upgraded connection ended"),
        }
    });
}
