//! Active health checking.
//!
//! # Responsibilities
//! - Probe every backend's health endpoint once per round, concurrently
//! - Skip backends inside their failure backoff window
//! - Update backend health state based on results
//! - Wait for the whole round before sleeping, so rounds never overlap

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time;

use crate::config::ProxyConfig;
use crate::health::state::ProbeOutcome;
use crate::http::request::target_uri;
use crate::load_balancer::backend::Backend;
use crate::load_balancer::registry::Registry;
use crate::net::connector::HttpClient;
use crate::net::dns::DnsCache;
use crate::observability::metrics;
use crate::resilience::backoff::FailureBackoff;

const PROBE_USER_AGENT: &str = concat!("health-proxy/", env!("CARGO_PKG_VERSION"), " health-check");

/// Settings for the probe loop.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Health endpoint path, appended to each backend's base URL.
    pub path: String,
    /// Sleep between rounds.
    pub interval: Duration,
    /// Deadline for a single probe request.
    pub timeout: Duration,
    /// Pre-built `Authorization` value, if a bearer token is configured.
    pub credential: Option<HeaderValue>,
    pub backoff: FailureBackoff,
}

impl ProbeSettings {
    pub fn from_config(config: &ProxyConfig, credential: Option<HeaderValue>) -> Self {
        Self {
            path: config.health.clone(),
            interval: config.interval(),
            timeout: config.probe_timeout(),
            credential,
            backoff: FailureBackoff::new(config.failure_window()),
        }
    }
}

/// Summary of one probe round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Backends probed this round.
    pub probed: usize,
    /// Backends skipped by the failure window.
    pub skipped: usize,
    /// Size of the healthy set once the round finished.
    pub healthy: usize,
}

#[derive(Clone)]
pub struct HealthMonitor {
    registry: Arc<Registry>,
    dns: Arc<DnsCache>,
    client: HttpClient,
    settings: Arc<ProbeSettings>,
}

impl HealthMonitor {
    pub fn new(
        registry: Arc<Registry>,
        dns: Arc<DnsCache>,
        client: HttpClient,
        settings: ProbeSettings,
    ) -> Self {
        Self {
            registry,
            dns,
            client,
            settings: Arc::new(settings),
        }
    }

    /// Probe forever: one round immediately, then one round per interval.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = ?self.settings.interval,
            timeout = ?self.settings.timeout,
            failure_window = ?self.settings.backoff.window(),
            path = %self.settings.path,
            backends = self.registry.len(),
            "Health monitor starting"
        );

        loop {
            tokio::select! {
                report = self.run_cycle(Instant::now()) => {
                    tracing::debug!(
                        probed = report.probed,
                        skipped = report.skipped,
                        healthy = report.healthy,
                        "Probe round complete"
                    );
                }
                _ = shutdown.recv() => break,
            }

            tokio::select! {
                _ = time::sleep(self.settings.interval) => {}
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Health monitor received shutdown signal, exiting loop");
    }

    /// Run a single probe round with every backoff decision taken at `now`.
    ///
    /// Returns once every dispatched probe has finished.
    pub async fn run_cycle(&self, now: Instant) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::default();
        let mut probes = JoinSet::new();

        for backend in self.registry.backends() {
            if self.settings.backoff.should_skip(backend, now) {
                tracing::debug!(backend = %backend.url, "Inside failure window, not probing");
                metrics::record_probe(backend.url.as_str(), ProbeOutcome::Skipped.label());
                report.skipped += 1;
                continue;
            }

            let monitor = self.clone();
            let backend = backend.clone();
            probes.spawn(async move {
                let outcome = monitor.probe(&backend).await;
                outcome.apply(&monitor.registry, backend.index, now);
                metrics::record_probe(backend.url.as_str(), outcome.label());
            });
            report.probed += 1;
        }

        while let Some(joined) = probes.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Probe task failed");
            }
        }

        report.healthy = self.registry.healthy_indices().len();
        metrics::record_probe_cycle(started.elapsed());
        report
    }

    /// Probe one backend and classify the result.
    pub async fn probe(&self, backend: &Backend) -> ProbeOutcome {
        match self.dns.resolve(&backend.host).await {
            Ok(ip) => backend.set_resolved_ip(Some(ip)),
            Err(e) => {
                backend.set_resolved_ip(None);
                tracing::debug!(backend = %backend.url, error = %e, "Health check failed: resolution error");
                return ProbeOutcome::ResolveFailed(e.to_string());
            }
        }

        let uri = match target_uri(&backend.url, &self.settings.path) {
            Ok(uri) => uri,
            Err(e) => return ProbeOutcome::TransportError(e.to_string()),
        };

        let mut builder = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::USER_AGENT, PROBE_USER_AGENT);
        if let Some(credential) = &self.settings.credential {
            builder = builder.header(header::AUTHORIZATION, credential.clone());
        }
        let request = match builder.body(Body::empty()) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!("Failed to build health check request: {}", e);
                return ProbeOutcome::TransportError(e.to_string());
            }
        };

        match time::timeout(self.settings.timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status() == StatusCode::OK => ProbeOutcome::Healthy,
            Ok(Ok(response)) => {
                tracing::debug!(backend = %backend.url, status = %response.status(), "Health check failed: non-200 status");
                ProbeOutcome::BadStatus(response.status())
            }
            Ok(Err(e)) => {
                tracing::debug!(backend = %backend.url, error = %e, "Health check failed: connection error");
                ProbeOutcome::TransportError(e.to_string())
            }
            Err(_) => {
                tracing::debug!(backend = %backend.url, "Health check failed: timeout");
                ProbeOutcome::TimedOut
            }
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}
