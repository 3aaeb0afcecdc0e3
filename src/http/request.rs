//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4) for inbound requests
//! - Build backend target URIs from a base URL and a path
//! - Prepare headers for forwarding (hop-by-hop removal, X-Forwarded-For,
//!   bearer credential)
//! - Detect protocol upgrade requests and keep their handshake headers
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The client's Host header is forwarded as-is
//! - The configured credential always wins over a client-supplied one

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use axum::http::uri::InvalidUri;
use axum::http::{Request, Uri};
use std::net::IpAddr;
use tower_http::request_id::{MakeRequestId, RequestId};
use url::{Position, Url};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Assigns a fresh UUID v4 to requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID of an inbound request, or "unknown".
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Build `Bearer <token>` as a sensitive header value.
pub fn bearer_credential(token: Option<&str>) -> Result<Option<HeaderValue>, InvalidHeaderValue> {
    token
        .map(|token| {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            value.set_sensitive(true);
            Ok(value)
        })
        .transpose()
}

/// Set the proxy's credential, replacing whatever the client sent.
pub fn apply_credential(headers: &mut HeaderMap, credential: Option<&HeaderValue>) {
    if let Some(value) = credential {
        headers.insert(header::AUTHORIZATION, value.clone());
    }
}

fn join_slash(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Absolute URI on `base` for `path_and_query`.
///
/// Scheme and authority come from `base`; its path is joined to the
/// request path with a single slash and the two query strings are merged.
pub fn target_uri(base: &Url, path_and_query: &str) -> Result<Uri, InvalidUri> {
    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, query),
        None => (path_and_query, ""),
    };

    let mut target = String::with_capacity(base.as_str().len() + path_and_query.len());
    target.push_str(base.scheme());
    target.push_str("://");
    target.push_str(&base[Position::BeforeHost..Position::AfterPort]);
    target.push_str(&join_slash(base.path(), path));

    let base_query = base.query().unwrap_or("");
    match (base_query.is_empty(), query.is_empty()) {
        (true, true) => {}
        (false, true) => {
            target.push('?');
            target.push_str(base_query);
        }
        (true, false) => {
            target.push('?');
            target.push_str(query);
        }
        (false, false) => {
            target.push('?');
            target.push_str(base_query);
            target.push('&');
            target.push_str(query);
        }
    }

    target.parse()
}

/// Headers that describe a single connection and must not be forwarded.
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove(header::UPGRADE);
}

fn connection_has_token(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|t| t.trim().eq_ignore_ascii_case(token))
}

/// Protocol named in `Upgrade` when `Connection` carries the `upgrade` token.
pub fn requested_upgrade(headers: &HeaderMap) -> Option<HeaderValue> {
    if !connection_has_token(headers, "upgrade") {
        return None;
    }
    headers.get(header::UPGRADE).cloned()
}

/// Put back the two headers an upgrade handshake needs after stripping.
pub fn restore_upgrade(headers: &mut HeaderMap, protocol: HeaderValue) {
    headers.insert(header::CONNECTION, HeaderValue::from_static("upgrade"));
    headers.insert(header::UPGRADE, protocol);
}

/// Append the client address to `X-Forwarded-For`.
pub fn append_forwarded_for(headers: &mut HeaderMap, client: IpAddr) {
    let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) if !prior.is_empty() => format!("{}, {}", prior, client),
        _ => client.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn target_keeps_path_and_query() {
        let uri = target_uri(&url("http://10.0.0.1:8080"), "/api/users?page=2").unwrap();
        assert_eq!(uri, "http://10.0.0.1:8080/api/users?page=2");

        let uri = target_uri(&url("https://api.internal"), "/").unwrap();
        assert_eq!(uri, "https://api.internal/");
    }

    #[test]
    fn target_joins_base_path() {
        let uri = target_uri(&url("http://h:81/prefix"), "/health").unwrap();
        assert_eq!(uri, "http://h:81/prefix/health");

        let uri = target_uri(&url("http://h:81/prefix/"), "/health").unwrap();
        assert_eq!(uri, "http://h:81/prefix/health");
    }

    #[test]
    fn target_merges_queries() {
        let uri = target_uri(&url("http://h/?tenant=a"), "/x?y=1").unwrap();
        assert_eq!(uri, "http://h/x?tenant=a&y=1");

        let uri = target_uri(&url("http://h/?tenant=a"), "/x").unwrap();
        assert_eq!(uri, "http://h/x?tenant=a");
    }

    #[test]
    fn target_drops_userinfo() {
        let uri = target_uri(&url("http://user:pw@h:9000"), "/").unwrap();
        assert_eq!(uri, "http://h:9000/");
    }

    #[test]
    fn credential_overrides_client_value() {
        let credential = bearer_credential(Some("s3cret")).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));

        apply_credential(&mut headers, credential.as_ref());
        assert_eq!(headers[header::AUTHORIZATION], "Bearer s3cret");
        assert!(headers[header::AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn no_credential_leaves_client_value() {
        assert!(bearer_credential(None).unwrap().is_none());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer client"));
        apply_credential(&mut headers, None);
        assert_eq!(headers[header::AUTHORIZATION], "Bearer client");
    }

    #[test]
    fn strips_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-session"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-session", HeaderValue::from_static("abc"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::ACCEPT], "*/*");
    }

    #[test]
    fn upgrade_needs_connection_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        assert_eq!(requested_upgrade(&headers), None);

        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, Upgrade"));
        assert_eq!(requested_upgrade(&headers), Some(HeaderValue::from_static("websocket")));
    }

    #[test]
    fn upgrade_headers_survive_restore() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("Upgrade"));
        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        headers.insert("sec-websocket-key", HeaderValue::from_static("dGhlIHNhbXBsZQ=="));

        let protocol = requested_upgrade(&headers).unwrap();
        strip_hop_by_hop(&mut headers);
        assert!(headers.get(header::UPGRADE).is_none());

        restore_upgrade(&mut headers, protocol);
        assert_eq!(headers[header::CONNECTION], "upgrade");
        assert_eq!(headers[header::UPGRADE], "websocket");
        assert_eq!(headers["sec-websocket-key"], "dGhlIHNhbXBsZQ==");
    }

    #[test]
    fn forwarded_for_appends() {
        let mut headers = HeaderMap::new();
        append_forwarded_for(&mut headers, "10.1.1.1".parse().unwrap());
        assert_eq!(headers[X_FORWARDED_FOR], "10.1.1.1");

        append_forwarded_for(&mut headers, "10.2.2.2".parse().unwrap());
        assert_eq!(headers[X_FORWARDED_FOR], "10.1.1.1, 10.2.2.2");
    }

    #[test]
    fn generated_request_ids_are_unique() {
        let mut generator = RequestIdGenerator;
        let req = Request::new(());
        let a = generator.make_request_id(&req).unwrap();
        let b = generator.make_request_id(&req).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
