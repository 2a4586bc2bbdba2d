//! Strategy executors
//!
//! Three independent algorithms governing how a request is resolved using
//! cache and network, each operating against one cache namespace:
//!
//! - [`cache_forever`] — serve from cache or seed it permanently
//! - [`fetch_then_cache`] — network-first with cache fallback
//! - [`stale_while_revalidate`] — cached immediately, refresh in background
//!
//! Executors take their collaborators as arguments; they hold no state of
//! their own and never touch more than one namespace.

pub mod cache_forever;
pub mod fetch_then_cache;
pub mod stale_while_revalidate;

use std::fmt;
use std::sync::Arc;

use crate::fetch::Fetcher;
use crate::request::{RequestDescriptor, StoredResponse};
use crate::store::CacheNamespace;
use crate::types::Result;

/// Which strategy a rule selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Serve from cache; first fetch seeds the entry permanently
    CacheForever,
    /// Network first, cache fallback on failure
    FetchThenCache,
    /// Cached copy immediately, background refresh for future reads
    StaleWhileRevalidate,
}

impl StrategyKind {
    /// Short name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::CacheForever => "cache-forever",
            StrategyKind::FetchThenCache => "fetch-then-cache",
            StrategyKind::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the served response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    /// Returned from a cache entry
    Cache,
    /// Returned from a live network fetch
    Network,
}

/// Run the selected strategy against one namespace
pub async fn run(
    kind: StrategyKind,
    namespace: &Arc<dyn CacheNamespace>,
    fetcher: &Arc<dyn Fetcher>,
    request: &RequestDescriptor,
) -> Result<(StoredResponse, ServedFrom)> {
    match kind {
        StrategyKind::CacheForever => cache_forever::run(namespace, fetcher, request).await,
        StrategyKind::FetchThenCache => fetch_then_cache::run(namespace, fetcher, request).await,
        StrategyKind::StaleWhileRevalidate => {
            stale_while_revalidate::run(namespace, fetcher, request).await
        }
    }
}
