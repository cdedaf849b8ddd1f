//! In-process cache store
//!
//! A plain map has no native expiry, so every entry records when it was
//! inserted and reads compare that against the injected [`Clock`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::clock::{Clock, SystemClock};
use super::store::{ttl_duration, CacheStore, StoreError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    inserted_at: DateTime<Utc>,
    ttl: Duration,
}

impl Entry {
    /// Valid iff `now - inserted_at < ttl`
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.inserted_at < self.ttl
    }
}

/// Cache store backed by a map guarded by an async `RwLock`
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store using the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store reading time from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of entries currently held, expired ones included until swept
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.is_fresh(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it unless a concurrent writer already replaced it.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| !entry.is_fresh(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let now = self.clock.now();
        let entry = Entry {
            value: value.to_string(),
            inserted_at: now,
            ttl: ttl_duration(ttl_secs),
        };

        let mut entries = self.entries.write().await;
        entries.retain(|_, existing| existing.is_fresh(now));
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.write().await.clear();
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
