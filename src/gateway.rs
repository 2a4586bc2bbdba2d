//! Gateway lifecycle and per-request interception
//!
//! The [`Gateway`] ties the pieces together: the router classifies a
//! request, the namespace registry resolves the target namespace for the
//! running build version, and the selected strategy executor serves the
//! request against that namespace. All collaborators (cache store, fetcher,
//! version string) are injected at construction; there is no ambient host
//! state.
//!
//! Lifecycle mirrors the host environment's three hooks: `install`
//! pre-populates the site namespace with the root document, `activate`
//! signals client takeover per the configured policy, and `handle` is the
//! per-request intercept entry point.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ClaimPolicy;
use crate::fetch::Fetcher;
use crate::namespace::{NamespaceKind, NamespaceRegistry};
use crate::request::{RequestDescriptor, StoredResponse};
use crate::router::{RouteAction, RouteConfig, Router};
use crate::store::CacheStore;
use crate::strategy::{self, ServedFrom, StrategyKind};
use crate::types::Result;

/// Outcome of one intercept call; produced exactly once per request
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The gateway answers the request
    Respond {
        response: StoredResponse,
        served_from: ServedFrom,
        strategy: StrategyKind,
    },
    /// Not intercepted; the request proceeds on the default network path
    PassThrough,
}

/// Counters over gateway outcomes
#[derive(Debug, Default)]
struct Counters {
    cache_serves: AtomicU64,
    network_serves: AtomicU64,
    pass_throughs: AtomicU64,
    failures: AtomicU64,
}

/// Snapshot of gateway outcome counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct GatewayStats {
    /// Requests answered from a cache entry
    pub cache_serves: u64,
    /// Requests answered from a live fetch
    pub network_serves: u64,
    /// Requests deliberately left unintercepted
    pub pass_throughs: u64,
    /// Requests where neither cache nor network could answer
    pub failures: u64,
}

/// Request-interception caching gateway
pub struct Gateway {
    registry: NamespaceRegistry,
    router: Router,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    claim_policy: ClaimPolicy,
    site_origin: String,
    counters: Counters,
}

impl Gateway {
    /// Create a gateway with injected collaborators
    pub fn new(
        route_config: RouteConfig,
        build_version: &str,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        claim_policy: ClaimPolicy,
    ) -> Self {
        let site_origin = route_config.site_origin.clone();
        info!(
            version = build_version,
            origin = %site_origin,
            claim_policy = ?claim_policy,
            "gateway initialized"
        );
        Self {
            registry: NamespaceRegistry::new(build_version),
            router: Router::new(route_config),
            store,
            fetcher,
            claim_policy,
            site_origin,
            counters: Counters::default(),
        }
    }

    /// The namespace registry for the running build version
    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// The router and its rule table
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Install: pre-populate the site namespace with the root document,
    /// then signal readiness to supersede any previous instance immediately.
    pub async fn install(&self) -> Result<()> {
        let name = self.registry.name_for(NamespaceKind::Site);
        let namespace = self.store.open(&name).await;
        let root = RequestDescriptor::get(&format!("{}/", self.site_origin));

        namespace.add_all(&[root], self.fetcher.as_ref()).await?;

        info!(namespace = %name, "install complete, superseding previous instance");
        Ok(())
    }

    /// Activate: take over clients per the configured policy and report
    /// namespaces orphaned by prior build versions (left for external
    /// cleanup, never deleted here).
    pub async fn activate(&self) {
        match self.claim_policy {
            ClaimPolicy::Immediate => {
                // Open sessions may mix old and new cached assets until
                // they next navigate; accepted trade-off.
                info!("activated, claiming all clients now");
            }
            ClaimPolicy::OnNavigation => {
                info!("activated, takeover deferred until next navigation");
            }
        }

        let existing = self.store.list_namespaces().await;
        let orphans = self.registry.orphaned(&existing);
        if !orphans.is_empty() {
            info!(
                count = orphans.len(),
                orphans = ?orphans,
                "orphaned namespaces from prior versions left for external cleanup"
            );
        }
    }

    /// Per-request intercept entry point.
    ///
    /// Routes the request, resolves the namespace, runs the strategy.
    /// `Err(NoResponseAvailable)` is, from the caller's point of view, the
    /// same as a failed network request.
    pub async fn handle(&self, request: &RequestDescriptor) -> Result<FetchOutcome> {
        match self.router.route(request) {
            RouteAction::PassThrough => {
                self.counters.pass_throughs.fetch_add(1, Ordering::Relaxed);
                debug!(url = %request.url, "pass-through");
                Ok(FetchOutcome::PassThrough)
            }
            RouteAction::Serve { strategy, kind } => {
                let name = self.registry.name_for(kind);
                let namespace = self.store.open(&name).await;

                match strategy::run(strategy, &namespace, &self.fetcher, request).await {
                    Ok((response, served_from)) => {
                        match served_from {
                            ServedFrom::Cache => {
                                self.counters.cache_serves.fetch_add(1, Ordering::Relaxed)
                            }
                            ServedFrom::Network => {
                                self.counters.network_serves.fetch_add(1, Ordering::Relaxed)
                            }
                        };
                        debug!(
                            url = %request.url,
                            strategy = %strategy,
                            namespace = %name,
                            served_from = ?served_from,
                            "request served"
                        );
                        Ok(FetchOutcome::Respond {
                            response,
                            served_from,
                            strategy,
                        })
                    }
                    Err(err) => {
                        self.counters.failures.fetch_add(1, Ordering::Relaxed);
                        warn!(url = %request.url, strategy = %strategy, error = %err, "request failed");
                        Err(err)
                    }
                }
            }
        }
    }

    /// Snapshot outcome counters
    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            cache_serves: self.counters.cache_serves.load(Ordering::Relaxed),
            network_serves: self.counters.network_serves.load(Ordering::Relaxed),
            pass_throughs: self.counters.pass_throughs.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}
