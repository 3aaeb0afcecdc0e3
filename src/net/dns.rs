//! DNS resolution cache.
//!
//! # Responsibilities
//! - Resolve a backend hostname to one IPv4 address under a deadline
//! - Cache the answer for the lifetime of the process
//! - Serve concurrent readers without a global lock
//!
//! # Design Decisions
//! - Entries never expire; a host whose address changes is not observed
//!   until restart
//! - No single-flight: concurrent misses for the same host may each look it
//!   up, the last writer wins with an equivalent answer
//! - Failed lookups are not cached, the next caller tries again
//! - IPv4 only, first address returned by the resolver

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time;

/// Error type for host resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("lookup of {host} timed out after {timeout:?}")]
    Timeout { host: String, timeout: Duration },

    #[error("failed to resolve {host}: {source}")]
    Lookup {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("no IPv4 address found for {0}")]
    NoAddress(String),
}

/// Source of raw address lookups.
pub trait Lookup: Send + Sync + 'static {
    /// Return every address the resolver knows for `host`.
    fn lookup(&self, host: &str) -> BoxFuture<'static, io::Result<Vec<IpAddr>>>;
}

/// Lookup through the operating system resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLookup;

impl Lookup for SystemLookup {
    fn lookup(&self, host: &str) -> BoxFuture<'static, io::Result<Vec<IpAddr>>> {
        let target = format!("{}:0", host);
        Box::pin(async move {
            let addrs = tokio::net::lookup_host(target).await?;
            Ok(addrs.map(|addr| addr.ip()).collect())
        })
    }
}

/// Process-wide cache of hostname → address.
pub struct DnsCache {
    entries: DashMap<String, IpAddr>,
    lookup: Arc<dyn Lookup>,
    timeout: Duration,
}

impl std::fmt::Debug for DnsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsCache")
            .field("entries", &self.entries.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DnsCache {
    /// Create a cache backed by the system resolver.
    pub fn new(timeout: Duration) -> Self {
        Self::with_lookup(Arc::new(SystemLookup), timeout)
    }

    /// Create a cache backed by a custom lookup source.
    pub fn with_lookup(lookup: Arc<dyn Lookup>, timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            lookup,
            timeout,
        }
    }

    /// Resolve `host`, consulting the cache first.
    pub async fn resolve(&self, host: &str) -> Result<IpAddr, ResolveError> {
        let key = host.to_ascii_lowercase();
        if let Some(ip) = self.cached(&key) {
            return Ok(ip);
        }

        let addrs = match time::timeout(self.timeout, self.lookup.lookup(&key)).await {
            Ok(Ok(addrs)) => addrs,
            Ok(Err(source)) => {
                return Err(ResolveError::Lookup {
                    host: key,
                    source,
                })
            }
            Err(_) => {
                return Err(ResolveError::Timeout {
                    host: key,
                    timeout: self.timeout,
                })
            }
        };

        let ip = addrs
            .into_iter()
            .find(IpAddr::is_ipv4)
            .ok_or_else(|| ResolveError::NoAddress(key.clone()))?;

        tracing::debug!(host = %key, ip = %ip, "Resolved backend host");
        self.entries.insert(key, ip);
        Ok(ip)
    }

    /// Cached address for `host`, if any.
    pub fn cached(&self, host: &str) -> Option<IpAddr> {
        self.entries.get(host).map(|entry| *entry.value())
    }

    /// Number of cached hosts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
