//! In-memory cache store
//!
//! Thread-safe with O(1) operations using DashMap. Entries are never
//! expired or evicted here: namespace replacement across build versions is
//! the only cache-busting mechanism (see `namespace.rs`).

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::{CacheNamespace, CacheStore};
use crate::request::StoredResponse;

/// Statistics for a single namespace
#[derive(Debug, Clone, Default, Serialize)]
pub struct NamespaceStats {
    /// Namespace name
    pub name: String,
    /// Number of entries stored
    pub entry_count: usize,
    /// Total stored body bytes
    pub total_bytes: u64,
    /// Lookup count
    pub reads: u64,
    /// Store count
    pub writes: u64,
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
}

impl NamespaceStats {
    /// Hit rate as a percentage of all reads
    pub fn hit_rate(&self) -> f64 {
        if self.reads == 0 {
            0.0
        } else {
            (self.hits as f64 / self.reads as f64) * 100.0
        }
    }
}

/// Aggregated statistics across all namespaces
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub namespaces: Vec<NamespaceStats>,
}

impl StoreStats {
    /// Total lookups across all namespaces
    pub fn total_reads(&self) -> u64 {
        self.namespaces.iter().map(|n| n.reads).sum()
    }

    /// Total stores across all namespaces
    pub fn total_writes(&self) -> u64 {
        self.namespaces.iter().map(|n| n.writes).sum()
    }
}

/// One named key→response mapping
struct MemoryNamespace {
    name: String,
    entries: DashMap<String, StoredResponse>,
    total_bytes: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryNamespace {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: DashMap::new(),
            total_bytes: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn stats(&self) -> NamespaceStats {
        NamespaceStats {
            name: self.name.clone(),
            entry_count: self.entries.len(),
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[async_trait::async_trait]
impl CacheNamespace for MemoryNamespace {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Option<StoredResponse> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(namespace = %self.name, key = key, "cache hit");
                Some(entry.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(namespace = %self.name, key = key, "cache miss");
                None
            }
        }
    }

    async fn put(&self, key: &str, response: StoredResponse) {
        let size = response.body.len() as u64;
        // Full replacement: keep byte accounting consistent across overwrites
        if let Some(old) = self.entries.insert(key.to_string(), response) {
            self.total_bytes
                .fetch_sub(old.body.len() as u64, Ordering::Relaxed);
        }
        self.total_bytes.fetch_add(size, Ordering::Relaxed);
        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!(namespace = %self.name, key = key, size = size, "entry stored");
    }
}

/// In-memory [`CacheStore`] keyed by namespace name.
///
/// Namespaces are created lazily on first open and never removed: orphans
/// from prior build versions linger until an external reaper acts.
pub struct MemoryStore {
    namespaces: DashMap<String, Arc<MemoryNamespace>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            namespaces: DashMap::new(),
        }
    }

    /// Snapshot statistics for every namespace
    pub fn stats(&self) -> StoreStats {
        let mut namespaces: Vec<NamespaceStats> = self
            .namespaces
            .iter()
            .map(|entry| entry.value().stats())
            .collect();
        namespaces.sort_by(|a, b| a.name.cmp(&b.name));
        StoreStats { namespaces }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, namespace: &str) -> Arc<dyn CacheNamespace> {
        let handle = self
            .namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(MemoryNamespace::new(namespace)))
            .clone();
        handle
    }

    async fn list_namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .namespaces
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}
