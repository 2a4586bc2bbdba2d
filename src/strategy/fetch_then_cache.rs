//! FetchThenCache strategy (network-first, cache-fallback)
//!
//! Always try the network first. A success-status response overwrites the
//! cached entry and is returned. A failure status or a fetch error falls
//! back to the previously cached entry; with nothing cached, the outcome is
//! `NoResponseAvailable`. Freshest data under normal connectivity, graceful
//! offline degradation once a successful fetch has happened.

use std::sync::Arc;
use tracing::{debug, warn};

use super::ServedFrom;
use crate::fetch::Fetcher;
use crate::request::{RequestDescriptor, StoredResponse};
use crate::store::CacheNamespace;
use crate::types::{GatewayError, Result};

/// Network first; fall back to the cached entry on any failure
pub async fn run(
    namespace: &Arc<dyn CacheNamespace>,
    fetcher: &Arc<dyn Fetcher>,
    request: &RequestDescriptor,
) -> Result<(StoredResponse, ServedFrom)> {
    let key = request.identity();

    match fetcher.fetch(request).await {
        Ok(response) if response.is_success() => {
            namespace.put(&key, response.clone()).await;
            debug!(url = %request.url, namespace = namespace.name(), "fetched fresh and cached");
            Ok((response, ServedFrom::Network))
        }
        Ok(response) => {
            debug!(url = %request.url, status = response.status, "origin signalled failure, trying cache");
            fall_back(namespace, request, &key, GatewayError::UpstreamError {
                url: request.url.clone(),
                status: response.status,
            })
            .await
        }
        Err(err) => {
            warn!(url = %request.url, error = %err, "fetch failed, trying cache");
            fall_back(namespace, request, &key, err).await
        }
    }
}

async fn fall_back(
    namespace: &Arc<dyn CacheNamespace>,
    request: &RequestDescriptor,
    key: &str,
    cause: GatewayError,
) -> Result<(StoredResponse, ServedFrom)> {
    match namespace.get(key).await {
        Some(cached) => Ok((cached, ServedFrom::Cache)),
        None => Err(cause.into_no_response(&request.url)),
    }
}
