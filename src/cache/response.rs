//! Degradation policy over a shared cache store
//!
//! Reads and writes never fail a request: a store error on lookup is a miss and
//! a failed write is logged and dropped. Only [`ResponseCache::clear`] reports
//! store failures to its caller.

use std::sync::Arc;

use super::store::{CacheStore, StoreError, CACHE_TTL_SECS};

/// Process-wide handle to the configured cache store
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl_secs: u64,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("backend", &self.store.backend())
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl ResponseCache {
    /// Wraps `store` with the standard 30 minute TTL
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            ttl_secs: CACHE_TTL_SECS,
        }
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Returns the cached payload for `key`, treating store failures as a miss
    pub async fn lookup(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(Some(value)) => {
                tracing::debug!(key = %key, backend = self.backend(), "cache hit");
                Some(value)
            }
            Ok(None) => {
                tracing::debug!(key = %key, backend = self.backend(), "cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, backend = self.backend(), error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Stores `value` under `key`; failures are logged and swallowed
    pub async fn store(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value, self.ttl_secs).await {
            tracing::warn!(key = %key, backend = self.backend(), error = %e, "cache write failed");
        }
    }

    /// Flushes the store, reporting failures
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear().await?;
        tracing::info!(backend = self.backend(), "cache cleared");
        Ok(())
    }
}
