//! Cache store interface
//!
//! The store is the only shared mutable resource in the gateway: a mapping
//! from namespace name to a persistent key→response mapping. Strategies see
//! one namespace at a time through [`CacheNamespace`]; there are no
//! cross-namespace transactions. Implementations must provide atomic
//! per-key put semantics (a single write is all-or-nothing); writes to the
//! same key from concurrent tasks are otherwise not serialized and last
//! completed write wins.

pub mod memory;

pub use memory::{MemoryStore, NamespaceStats, StoreStats};

use async_trait::async_trait;
use std::sync::Arc;

use crate::fetch::Fetcher;
use crate::request::{RequestDescriptor, StoredResponse};
use crate::types::{GatewayError, Result};

/// Handle to one named namespace within the store
#[async_trait]
pub trait CacheNamespace: Send + Sync {
    /// Namespace name this handle is bound to
    fn name(&self) -> &str;

    /// Look up an entry by request identity
    async fn get(&self, key: &str) -> Option<StoredResponse>;

    /// Store an entry, fully replacing any prior value for the key
    async fn put(&self, key: &str, response: StoredResponse);

    /// Fetch each request and store it, failing on the first non-success.
    ///
    /// Used once at install time to pre-populate the site namespace. Any
    /// fetch error or non-2xx status aborts the whole operation.
    async fn add_all(
        &self,
        requests: &[RequestDescriptor],
        fetcher: &dyn Fetcher,
    ) -> Result<()> {
        for request in requests {
            let response = fetcher.fetch(request).await?;
            if !response.is_success() {
                return Err(GatewayError::UpstreamError {
                    url: request.url.clone(),
                    status: response.status,
                });
            }
            self.put(&request.identity(), response).await;
        }
        Ok(())
    }
}

/// A set of named persistent key→response stores
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open a namespace by name, creating it if absent
    async fn open(&self, namespace: &str) -> Arc<dyn CacheNamespace>;

    /// Names of all namespaces currently present in the store
    async fn list_namespaces(&self) -> Vec<String>;
}
