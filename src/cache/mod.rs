//! Response caching
//!
//! This module provides the [`CacheStore`] abstraction with in-process, Redis,
//! on-disk and disabled backends, plus [`ResponseCache`], which applies the
//! degrade-to-miss policy so the service stays up when the backend does not.

mod clock;
mod disk;
mod memory;
mod noop;
mod redis_store;
mod response;
mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use clock::{Clock, ManualClock, SystemClock};
pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use noop::NoopStore;
pub use redis_store::{
    redis_url, RedisStore, DEFAULT_COMMAND_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_RETRY_AFTER,
};
pub use response::ResponseCache;
pub use store::{cache_key, CacheStore, StoreError, CACHE_TTL_SECS};

/// Which store backs the response cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CacheBackend {
    /// Shared Redis instance with native expiry
    Redis,
    /// Map inside this process
    Memory,
    /// JSON files in the cache directory
    Disk,
    /// Caching disabled
    None,
}

/// Settings needed to construct a store
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub redis_url: String,
    pub cache_dir: Option<PathBuf>,
    pub connect_timeout: Duration,
}

/// Creates the configured store
///
/// Never fails: a Redis instance that is down at startup is logged and
/// reconnected on later calls, and an unusable configuration falls back to
/// [`NoopStore`].
pub async fn build_store(settings: &CacheSettings) -> Arc<dyn CacheStore> {
    match settings.backend {
        CacheBackend::Memory => Arc::new(MemoryStore::new()),
        CacheBackend::None => Arc::new(NoopStore),
        CacheBackend::Disk => {
            let store = match &settings.cache_dir {
                Some(dir) => DiskStore::with_dir(dir.clone()),
                None => match DiskStore::new() {
                    Some(store) => store,
                    None => {
                        tracing::warn!("no cache directory available, caching disabled");
                        return Arc::new(NoopStore);
                    }
                },
            };
            tracing::info!(dir = %store.cache_dir().display(), "using disk cache");
            Arc::new(store)
        }
        CacheBackend::Redis => match RedisStore::new(&settings.redis_url) {
            Ok(store) => {
                let store = store.with_connect_timeout(settings.connect_timeout);
                match store.ping().await {
                    Ok(()) => tracing::info!("connected to redis cache"),
                    Err(e) => tracing::warn!(
                        error = %e,
                        "redis cache unreachable, serving upstream-only until it recovers"
                    ),
                }
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(error = %e, "invalid redis configuration, caching disabled");
                Arc::new(NoopStore)
            }
        },
    }
}
