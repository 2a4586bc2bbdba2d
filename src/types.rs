//! Shared error and result types

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Error types for gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The fetch itself failed (connection refused, DNS, reset, ...)
    #[error("network fetch failed for {url}: {reason}")]
    NetworkFailure { url: String, reason: String },

    /// The fetch resolved but the origin signalled failure
    #[error("origin returned status {status} for {url}")]
    UpstreamError { url: String, status: u16 },

    /// No entry stored under the request identity
    #[error("no cached entry for {key}")]
    CacheMiss { key: String },

    /// Terminal: neither cache nor network could satisfy the request
    #[error("no response available for {url}")]
    NoResponseAvailable { url: String },

    /// Serve-loop I/O failure (bind, accept)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Collapse a recoverable failure into the terminal outcome for a URL.
    ///
    /// Strategies use this at the point where no fallback remains: whatever
    /// went wrong upstream, the caller only sees that no response exists.
    pub fn into_no_response(self, url: &str) -> GatewayError {
        match self {
            GatewayError::NoResponseAvailable { .. } => self,
            _ => GatewayError::NoResponseAvailable {
                url: url.to_string(),
            },
        }
    }
}
