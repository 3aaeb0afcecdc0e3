//! Outbound connector stack shared by the prober and the dispatcher.
//!
//! ```text
//! Client
//!   → BoundedConnector   (deadline over TCP connect + TLS handshake)
//!   → HttpsConnector     (rustls, http or https)
//!   → HttpConnector      (connect timeout, TCP keep-alive)
//!   → CachedResolver     (DnsCache, TCP goes to the cached address)
//! ```

use axum::body::Body;
use axum::http::Uri;
use futures_util::future::BoxFuture;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::dns::Name;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

use crate::net::dns::{DnsCache, ResolveError};
use crate::resilience::timeouts::TransportTimeouts;

type BoxError = Box<dyn StdError + Send + Sync>;

/// HTTP client used for every outbound call.
pub type HttpClient = Client<BoundedConnector<HttpsConnector<HttpConnector<CachedResolver>>>, Body>;

/// Hostname resolver backed by the process DNS cache.
///
/// Literal IP hosts never reach the resolver; the connector parses them directly.
#[derive(Debug, Clone)]
pub struct CachedResolver {
    cache: Arc<DnsCache>,
}

impl CachedResolver {
    pub fn new(cache: Arc<DnsCache>) -> Self {
        Self { cache }
    }
}

impl Service<Name> for CachedResolver {
    type Response = std::vec::IntoIter<SocketAddr>;
    type Error = ResolveError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, name: Name) -> Self::Future {
        let cache = self.cache.clone();
        Box::pin(async move {
            let ip = cache.resolve(name.as_str()).await?;
            // The HTTP connector fills in the port from the URI.
            Ok(vec![SocketAddr::new(ip, 0)].into_iter())
        })
    }
}

/// Applies one deadline to the whole connect phase of the wrapped connector.
#[derive(Debug, Clone)]
pub struct BoundedConnector<C> {
    inner: C,
    deadline: Duration,
}

impl<C> BoundedConnector<C> {
    pub fn new(inner: C, deadline: Duration) -> Self {
        Self { inner, deadline }
    }
}

impl<C> Service<Uri> for BoundedConnector<C>
where
    C: Service<Uri>,
    C::Future: Send + 'static,
    C::Response: Send + 'static,
    C::Error: Into<BoxError>,
{
    type Response = C::Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let deadline = self.deadline;
        let connecting = self.inner.call(uri);
        Box::pin(async move {
            match tokio::time::timeout(deadline, connecting).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect and TLS handshake exceeded {:?}", deadline),
                )) as BoxError),
            }
        })
    }
}

/// Build the outbound client from transport timeouts.
///
/// TCP connect is bounded by the dial timeout; connect plus TLS handshake
/// together are bounded by dial + handshake timeouts.
pub fn build_client(dns: Arc<DnsCache>, timeouts: &TransportTimeouts) -> HttpClient {
    let mut http = HttpConnector::new_with_resolver(CachedResolver::new(dns));
    http.enforce_http(false);
    http.set_nodelay(true);
    http.set_connect_timeout(Some(timeouts.dial));
    http.set_keepalive(Some(timeouts.keep_alive));

    let https = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    let connector = BoundedConnector::new(https, timeouts.dial + timeouts.tls_handshake);

    Client::builder(TokioExecutor::new()).build(connector)
}
