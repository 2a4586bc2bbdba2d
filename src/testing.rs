//! Test doubles: a scripted network
//!
//! [`ScriptedFetcher`] plays the network in tests. Responses are queued in
//! call order; an unscripted call resolves as a network failure, which
//! doubles as "network unreachable" in offline scenarios.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::fetch::Fetcher;
use crate::request::{RequestDescriptor, StoredResponse};
use crate::types::{GatewayError, Result};

enum Scripted {
    Ok(StoredResponse),
    OkDelayed(StoredResponse, Duration),
    NetworkFailure(String),
}

/// [`Fetcher`] that replays a queue of scripted results
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicU64,
    urls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicU64::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response for the next fetch
    pub fn script_ok(&self, response: StoredResponse) {
        self.script.lock().unwrap().push_back(Scripted::Ok(response));
    }

    /// Queue a response delivered only after a delay (simulated latency)
    pub fn script_ok_delayed(&self, response: StoredResponse, delay: Duration) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::OkDelayed(response, delay));
    }

    /// Queue a transport-level failure for the next fetch
    pub fn script_network_failure(&self, reason: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::NetworkFailure(reason.to_string()));
    }

    /// How many fetches were attempted
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// URLs fetched, in call order
    pub fn fetched_urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<StoredResponse> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.urls.lock().unwrap().push(request.url.clone());

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Ok(response)) => Ok(response),
            Some(Scripted::OkDelayed(response, delay)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(Scripted::NetworkFailure(reason)) => Err(GatewayError::NetworkFailure {
                url: request.url.clone(),
                reason,
            }),
            None => Err(GatewayError::NetworkFailure {
                url: request.url.clone(),
                reason: "network unreachable (nothing scripted)".to_string(),
            }),
        }
    }
}

/// Poll a condition until it holds or a bounded wait expires.
///
/// Used to observe detached background writes without a completion handle.
pub async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..250 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    false
}
