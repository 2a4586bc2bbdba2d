//! StaleWhileRevalidate strategy
//!
//! With a warm cache the caller gets the cached copy immediately while a
//! detached task refreshes the entry for future reads. The refresh task has
//! no handle and no error channel back to the caller: its write lands after
//! the current response has already been returned, and its failures are
//! logged and swallowed. Cold, the caller waits on the fetch and that
//! result becomes the response (stored only on success status).
//!
//! Low latency once warmed, eventual freshness.

use std::sync::Arc;
use tracing::{debug, warn};

use super::ServedFrom;
use crate::fetch::Fetcher;
use crate::request::{RequestDescriptor, StoredResponse};
use crate::store::CacheNamespace;
use crate::types::Result;

/// Serve the cached copy and refresh in the background; block only when cold
pub async fn run(
    namespace: &Arc<dyn CacheNamespace>,
    fetcher: &Arc<dyn Fetcher>,
    request: &RequestDescriptor,
) -> Result<(StoredResponse, ServedFrom)> {
    let key = request.identity();

    if let Some(cached) = namespace.get(&key).await {
        spawn_revalidation(Arc::clone(namespace), Arc::clone(fetcher), request.clone(), key);
        return Ok((cached, ServedFrom::Cache));
    }

    // Cold start: the caller waits on the same fetch that warms the cache.
    // Whatever the origin answers is the response, non-success included;
    // only success statuses are written back for future reads.
    let response = fetcher
        .fetch(request)
        .await
        .map_err(|err| err.into_no_response(&request.url))?;

    if response.is_success() {
        namespace.put(&key, response.clone()).await;
        debug!(url = %request.url, namespace = namespace.name(), "cold fetch stored");
    } else {
        debug!(url = %request.url, status = response.status, "cold fetch served unstored, origin signalled failure");
    }

    Ok((response, ServedFrom::Network))
}

/// Detached refresh: fetch, store on success, swallow everything else
fn spawn_revalidation(
    namespace: Arc<dyn CacheNamespace>,
    fetcher: Arc<dyn Fetcher>,
    request: RequestDescriptor,
    key: String,
) {
    tokio::spawn(async move {
        match fetcher.fetch(&request).await {
            Ok(response) if response.is_success() => {
                namespace.put(&key, response).await;
                debug!(url = %request.url, namespace = namespace.name(), "revalidated in background");
            }
            Ok(response) => {
                debug!(url = %request.url, status = response.status, "revalidation skipped, origin signalled failure");
            }
            Err(err) => {
                warn!(url = %request.url, error = %err, "background revalidation failed");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CacheStore, MemoryStore};
    use crate::testing::{eventually, ScriptedFetcher};
    use crate::types::GatewayError;
    use std::time::Duration;

    async fn setup() -> (Arc<dyn CacheNamespace>, Arc<ScriptedFetcher>) {
        let store = MemoryStore::new();
        let ns = store.open("skin-v1.0.0").await;
        (ns, Arc::new(ScriptedFetcher::new()))
    }

    fn req() -> RequestDescriptor {
        RequestDescriptor::get("https://example.com/skins/default/theme.css")
    }

    #[tokio::test]
    async fn test_warm_returns_cached_and_refreshes() {
        let (ns, fetcher) = setup().await;
        ns.put(&req().identity(), StoredResponse::ok("S1")).await;
        fetcher.script_ok(StoredResponse::ok("S2"));
        let dyn_fetcher: Arc<dyn Fetcher> = fetcher.clone();

        let (response, from) = run(&ns, &dyn_fetcher, &req()).await.unwrap();
        assert_eq!(response.body, "S1");
        assert_eq!(from, ServedFrom::Cache);

        // The background write lands after the response was returned
        let ns_poll = Arc::clone(&ns);
        assert!(
            eventually(|| {
                let ns = Arc::clone(&ns_poll);
                async move {
                    ns.get(&req().identity())
                        .await
                        .map(|r| r.body == "S2")
                        .unwrap_or(false)
                }
            })
            .await
        );

        let (fresh, _) = run(&ns, &dyn_fetcher, &req()).await.unwrap();
        assert_eq!(fresh.body, "S2");
    }

    #[tokio::test]
    async fn test_warm_does_not_wait_for_network() {
        let (ns, fetcher) = setup().await;
        ns.put(&req().identity(), StoredResponse::ok("S1")).await;
        // A refresh that would take far longer than the test
        fetcher.script_ok_delayed(StoredResponse::ok("S2"), Duration::from_secs(30));
        let dyn_fetcher: Arc<dyn Fetcher> = fetcher.clone();

        let start = std::time::Instant::now();
        let (response, _) = run(&ns, &dyn_fetcher, &req()).await.unwrap();
        assert_eq!(response.body, "S1");
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_background_failure_is_swallowed() {
        let (ns, fetcher) = setup().await;
        ns.put(&req().identity(), StoredResponse::ok("S1")).await;
        fetcher.script_network_failure("offline");
        let dyn_fetcher: Arc<dyn Fetcher> = fetcher.clone();

        let (response, _) = run(&ns, &dyn_fetcher, &req()).await.unwrap();
        assert_eq!(response.body, "S1");

        // Give the background task a chance to run; entry must survive
        let fetcher_poll = fetcher.clone();
        eventually(move || {
            let fetcher = fetcher_poll.clone();
            async move { fetcher.call_count() == 1 }
        })
        .await;
        assert_eq!(ns.get(&req().identity()).await.unwrap().body, "S1");
    }

    #[tokio::test]
    async fn test_background_non_success_not_written() {
        let (ns, fetcher) = setup().await;
        ns.put(&req().identity(), StoredResponse::ok("S1")).await;
        fetcher.script_ok(StoredResponse::new(500, "boom"));
        let dyn_fetcher: Arc<dyn Fetcher> = fetcher.clone();

        run(&ns, &dyn_fetcher, &req()).await.unwrap();

        let fetcher_poll = fetcher.clone();
        eventually(move || {
            let fetcher = fetcher_poll.clone();
            async move { fetcher.call_count() == 1 }
        })
        .await;
        assert_eq!(ns.get(&req().identity()).await.unwrap().body, "S1");
    }

    #[tokio::test]
    async fn test_cold_start_blocks_and_stores() {
        let (ns, fetcher) = setup().await;
        fetcher.script_ok(StoredResponse::ok("S1"));
        let dyn_fetcher: Arc<dyn Fetcher> = fetcher.clone();

        let (response, from) = run(&ns, &dyn_fetcher, &req()).await.unwrap();
        assert_eq!(response.body, "S1");
        assert_eq!(from, ServedFrom::Network);
        assert_eq!(ns.get(&req().identity()).await.unwrap().body, "S1");
        // One fetch serves both the caller and the cache warm-up
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cold_scenario_warm_then_refresh() {
        // Cold S1 -> warm S1 while refreshing to S2 -> S2 after settle
        let (ns, fetcher) = setup().await;
        fetcher.script_ok(StoredResponse::ok("S1"));
        fetcher.script_ok(StoredResponse::ok("S2"));
        let dyn_fetcher: Arc<dyn Fetcher> = fetcher.clone();

        let (first, _) = run(&ns, &dyn_fetcher, &req()).await.unwrap();
        assert_eq!(first.body, "S1");

        let (second, from) = run(&ns, &dyn_fetcher, &req()).await.unwrap();
        assert_eq!(second.body, "S1");
        assert_eq!(from, ServedFrom::Cache);

        let ns_poll = Arc::clone(&ns);
        assert!(
            eventually(|| {
                let ns = Arc::clone(&ns_poll);
                async move {
                    ns.get(&req().identity())
                        .await
                        .map(|r| r.body == "S2")
                        .unwrap_or(false)
                }
            })
            .await
        );

        let (third, _) = run(&ns, &dyn_fetcher, &req()).await.unwrap();
        assert_eq!(third.body, "S2");
    }

    #[tokio::test]
    async fn test_cold_network_failure_is_terminal() {
        let (ns, fetcher) = setup().await;
        fetcher.script_network_failure("offline");
        let dyn_fetcher: Arc<dyn Fetcher> = fetcher.clone();

        let err = run(&ns, &dyn_fetcher, &req()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NoResponseAvailable { .. }));
    }

    #[tokio::test]
    async fn test_cold_failure_status_served_but_not_stored() {
        // The origin's own 404/500 page goes to the caller; only success
        // statuses warm the cache.
        let (ns, fetcher) = setup().await;
        fetcher.script_ok(StoredResponse::new(503, "down"));
        let dyn_fetcher: Arc<dyn Fetcher> = fetcher.clone();

        let (response, from) = run(&ns, &dyn_fetcher, &req()).await.unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.body, "down");
        assert_eq!(from, ServedFrom::Network);
        assert!(ns.get(&req().identity()).await.is_none());
    }

    #[tokio::test]
    async fn test_cold_failure_status_does_not_pin() {
        // A later successful fetch still warms the cache normally
        let (ns, fetcher) = setup().await;
        fetcher.script_ok(StoredResponse::new(404, "missing"));
        fetcher.script_ok(StoredResponse::ok("S1"));
        let dyn_fetcher: Arc<dyn Fetcher> = fetcher.clone();

        let (first, _) = run(&ns, &dyn_fetcher, &req()).await.unwrap();
        assert_eq!(first.status, 404);

        let (second, from) = run(&ns, &dyn_fetcher, &req()).await.unwrap();
        assert_eq!(second.body, "S1");
        assert_eq!(from, ServedFrom::Network);
        assert_eq!(ns.get(&req().identity()).await.unwrap().body, "S1");
    }
}
