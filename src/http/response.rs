//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay backend responses to the client
//! - Map proxy failures to client-visible status codes
//!
//! # Status Mapping
//! ```text
//! NoHealthyBackends          → 503 (no backend was attempted)
//! Upstream transport error   → 502 (a backend was attempted and failed)
//! Response header timeout    → 502
//! 101 for another protocol   → 502
//! Unbuildable target URI     → 500
//! ```
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped, everything else passed through verbatim
//! - Every error response carries a non-empty plain-text body

use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;
use std::time::Duration;
use thiserror::Error;

use crate::http::request::{restore_upgrade, strip_hop_by_hop};
use crate::load_balancer::SelectError;

/// Failure while dispatching one client request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Select(#[from] SelectError),

    #[error("invalid backend target: {0}")]
    InvalidTarget(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] hyper_util::client::legacy::Error),

    #[error("no response headers within {0:?}")]
    ResponseHeaderTimeout(Duration),

    #[error("backend switched protocols to {got:?} when {asked:?} was requested")]
    UpgradeMismatch { asked: String, got: String },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Select(SelectError::NoHealthyBackends) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::InvalidTarget(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream(_)
            | ProxyError::ResponseHeaderTimeout(_)
            | ProxyError::UpgradeMismatch { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = status.canonical_reason().unwrap_or("Proxy Error");
        (status, body).into_response()
    }
}

/// Turn a backend response into a client response, streaming the body.
pub fn relay(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// Turn a backend `101 Switching Protocols` into the client's, keeping the
/// upgrade handshake headers. The connection itself is spliced elsewhere.
pub fn relay_switching(response: Response<Incoming>, protocol: HeaderValue) -> Response<Body> {
    let (mut parts, _) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    restore_upgrade(&mut parts.headers, protocol);
    Response::from_parts(parts, Body::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_healthy_backends_is_503_with_body() {
        let response = ProxyError::from(SelectError::NoHealthyBackends).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Service Unavailable");
    }

    #[tokio::test]
    async fn header_timeout_is_502() {
        let response = ProxyError::ResponseHeaderTimeout(Duration::from_secs(5)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Bad Gateway");
    }

    #[test]
    fn upgrade_mismatch_is_502() {
        let err = ProxyError::UpgradeMismatch {
            asked: "websocket".into(),
            got: "h2c".into(),
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn invalid_target_is_500() {
        let err = ProxyError::InvalidTarget("bad".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
