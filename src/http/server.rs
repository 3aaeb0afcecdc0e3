//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the backend registry, DNS cache and outbound client from config
//! - Create the Axum Router: every method and path goes to the dispatcher
//! - Wire up middleware (tracing, request ID)
//! - Run the health monitor alongside the server
//! - Graceful shutdown of both on one signal

use axum::http::header::InvalidHeaderValue;
use axum::http::HeaderValue;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::SetRequestIdLayer;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::health::active::{HealthMonitor, ProbeSettings};
use crate::http::proxy::proxy_handler;
use crate::http::request::{bearer_credential, RequestIdGenerator};
use crate::load_balancer::random::RandomSelector;
use crate::load_balancer::registry::{Registry, RegistryError};
use crate::load_balancer::LoadBalancer;
use crate::net::connector::{build_client, HttpClient};
use crate::net::dns::DnsCache;
use crate::resilience::timeouts::TransportTimeouts;

/// Error type for server construction and serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("bearer token is not a valid header value: {0}")]
    Credential(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub balancer: Arc<dyn LoadBalancer>,
    pub client: HttpClient,
    pub credential: Option<HeaderValue>,
    pub timeouts: TransportTimeouts,
}

/// HTTP server for the load-balancing proxy.
pub struct HttpServer {
    router: Router,
    registry: Arc<Registry>,
    monitor: HealthMonitor,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let registry = Arc::new(Registry::new(&config.backends)?);
        let dns = Arc::new(DnsCache::new(config.dns_timeout()));
        let timeouts = TransportTimeouts::from_config(&config);
        let client = build_client(dns.clone(), &timeouts);
        let credential = bearer_credential(config.bearer_token.as_deref())?;

        tracing::debug!(
            dial = ?timeouts.dial,
            keep_alive = ?timeouts.keep_alive,
            tls_handshake = ?timeouts.tls_handshake,
            response_header = ?timeouts.response_header,
            expect_continue = ?timeouts.expect_continue,
            bearer = credential.is_some(),
            "Transport configured"
        );

        let monitor = HealthMonitor::new(
            registry.clone(),
            dns,
            client.clone(),
            ProbeSettings::from_config(&config, credential.clone()),
        );

        let state = AppState {
            registry: registry.clone(),
            balancer: Arc::new(RandomSelector::new()),
            client,
            credential,
            timeouts,
        };

        Ok(Self {
            router: Self::build_router(state),
            registry,
            monitor,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(RequestIdGenerator))
    }

    /// Run the server and the health monitor until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.registry.len(),
            "HTTP server starting"
        );

        let monitor = tokio::spawn(self.monitor.run(shutdown.resubscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        monitor.abort();
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}
