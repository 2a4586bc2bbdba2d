//! Network fetch seam
//!
//! Strategies reach the network only through the [`Fetcher`] trait, so the
//! network can be played by a script in tests. A fetch that reaches the
//! origin resolves `Ok` whatever the status code; only a transport-level
//! failure is an error. Status interpretation belongs to the strategies.
//!
//! No timeout is imposed here: a hung origin hangs the requesting task.
//! Hardening opportunity if the host environment does not impose its own
//! request timeout.

use async_trait::async_trait;
use tracing::debug;

use crate::request::{RequestDescriptor, StoredResponse};
use crate::types::{GatewayError, Result};

/// Performs a network fetch for a request descriptor
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the request from the network.
    ///
    /// Resolves `Ok` for any completed HTTP exchange, including non-2xx.
    /// `Err(NetworkFailure)` means the exchange itself failed.
    async fn fetch(&self, request: &RequestDescriptor) -> Result<StoredResponse>;
}

/// [`Fetcher`] backed by a reqwest client
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a fresh client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<StoredResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            GatewayError::NetworkFailure {
                url: request.url.clone(),
                reason: format!("invalid method {}: {e}", request.method),
            }
        })?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::NetworkFailure {
                url: request.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::NetworkFailure {
                url: request.url.clone(),
                reason: format!("body read failed: {e}"),
            })?;

        debug!(url = %request.url, status = status, size = body.len(), "fetched from origin");

        Ok(StoredResponse {
            status,
            headers,
            body,
        })
    }
}
