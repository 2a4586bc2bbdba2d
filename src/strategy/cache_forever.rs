//! CacheForever strategy
//!
//! Look up the entry; if present, return it without touching the network.
//! If absent, fetch and store whatever comes back — no status check — then
//! return it. The first completed fetch permanently seeds the cache; only a
//! new namespace version busts it.
//!
//! Inherited behavior, kept deliberately: a non-success response (say a
//! 404 during a partial deploy) is pinned until the next version bump.

use std::sync::Arc;
use tracing::info;

use super::ServedFrom;
use crate::fetch::Fetcher;
use crate::request::{RequestDescriptor, StoredResponse};
use crate::store::CacheNamespace;
use crate::types::Result;

/// Serve from cache, seeding it permanently on first miss
pub async fn run(
    namespace: &Arc<dyn CacheNamespace>,
    fetcher: &Arc<dyn Fetcher>,
    request: &RequestDescriptor,
) -> Result<(StoredResponse, ServedFrom)> {
    let key = request.identity();

    if let Some(cached) = namespace.get(&key).await {
        return Ok((cached, ServedFrom::Cache));
    }

    // Only a fetch-layer failure prevents a response here
    let response = fetcher.fetch(request).await?;

    namespace.put(&key, response.clone()).await;
    info!(url = %request.url, namespace = namespace.name(), status = response.status, "cached forever");

    Ok((response, ServedFrom::Network))
}
