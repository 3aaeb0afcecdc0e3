//! Proxy dispatcher.
//!
//! # Responsibilities
//! - Pick a healthy backend for each inbound request
//! - Rewrite the request onto the backend and forward it
//! - Inject the configured bearer credential
//! - Stream the backend response back, or map the failure to 502/503
//! - Pass protocol upgrades through as a raw byte splice
//!
//! # Design Decisions
//! - No retry within a request; the client retrying gets a fresh pick
//! - A client disconnect drops the in-flight forward and its connection
//! - Forwarding outcomes never touch backend health; only probes do

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderValue, Request, StatusCode, Version};
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::time::Instant;

use crate::http::body::NotifyOnEnd;
use crate::http::request::{
    append_forwarded_for, apply_credential, request_id, requested_upgrade, restore_upgrade,
    strip_hop_by_hop, target_uri,
};
use crate::http::response::{relay, relay_switching, ProxyError};
use crate::http::server::AppState;
use crate::http::upgrade;
use crate::load_balancer::backend::Backend;
use crate::observability::metrics;
use crate::resilience::timeouts::deadline_after;

/// Entry point for every inbound request, whatever its method or path.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().clone();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        "Received request"
    );

    let backend = match state.balancer.next_server(&state.registry) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!(request_id = %request_id, "No healthy backends available");
            metrics::record_request(method.as_str(), 503, "none", start);
            return ProxyError::from(e).into_response();
        }
    };

    tracing::debug!(request_id = %request_id, backend = %backend.url, "Proxying request");

    match forward(&state, &backend, request).await {
        Ok(response) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), backend.url.as_str(), start);
            tracing::debug!(
                request_id = %request_id,
                status = %response.status(),
                elapsed = ?start.elapsed(),
                "Request completed"
            );
            response
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, backend = %backend.url, error = %e, "Proxy error");
            metrics::record_request(method.as_str(), e.status().as_u16(), backend.url.as_str(), start);
            e.into_response()
        }
    }
}

/// Forward `request` to `backend` and relay the response.
///
/// The response-header deadline starts once the request body has been fully
/// written upstream, so slow uploads are not cut short.
pub async fn forward(
    state: &AppState,
    backend: &Backend,
    mut request: Request<Body>,
) -> Result<Response, ProxyError> {
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let switch = requested_upgrade(request.headers())
        .map(|protocol| (protocol, hyper::upgrade::on(&mut request)));
    let (mut parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = target_uri(&backend.url, path_and_query)
        .map_err(|e| ProxyError::InvalidTarget(e.to_string()))?;
    parts.uri = target;
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    if let Some((protocol, _)) = &switch {
        restore_upgrade(&mut parts.headers, protocol.clone());
    }
    if let Some(addr) = client_addr {
        append_forwarded_for(&mut parts.headers, addr.ip());
    }
    apply_credential(&mut parts.headers, state.credential.as_ref());

    let (body, written) = NotifyOnEnd::wrap(body);
    let outbound = Request::from_parts(parts, body);
    let deadline = state.timeouts.response_header;
    let mut response = deadline_after(written, deadline, state.client.request(outbound))
        .await
        .map_err(|_| ProxyError::ResponseHeaderTimeout(deadline))?
        .map_err(ProxyError::Upstream)?;

    if response.status() != StatusCode::SWITCHING_PROTOCOLS {
        return Ok(relay(response));
    }

    let got = response.headers().get(header::UPGRADE).cloned();
    match (switch, got) {
        (Some((asked, client_side)), Some(got))
            if asked.as_bytes().eq_ignore_ascii_case(got.as_bytes()) =>
        {
            let backend_side = hyper::upgrade::on(&mut response);
            upgrade::splice(client_side, backend_side, backend.url.to_string());
            Ok(relay_switching(response, got))
        }
        (asked, got) => Err(ProxyError::UpgradeMismatch {
            asked: header_text(asked.as_ref().map(|(protocol, _)| protocol)),
            got: header_text(got.as_ref()),
        }),
    }
}

fn header_text(value: Option<&HeaderValue>) -> String {
    value
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}
