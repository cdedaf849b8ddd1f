//! Cache store contract shared by every backend

use async_trait::async_trait;
use chrono::Duration;
use thiserror::Error;

/// Fixed time-to-live for cached responses, in seconds (30 minutes)
pub const CACHE_TTL_SECS: u64 = 1800;

/// Errors raised by a cache backend
///
/// Callers treat these as degraded service rather than request failures; only
/// an explicit cache flush surfaces them to the client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    /// Connecting to the backend took longer than the configured timeout
    #[error("timed out connecting to cache backend")]
    Timeout,

    /// Redis command failed
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Filesystem operation failed
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored entry could not be encoded or decoded
    #[error("cache entry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key/value store with per-entry expiry
///
/// A value written with `ttl_secs = T` is returned by `get` until `T` seconds
/// have elapsed and is absent afterwards. Implementations must be safe to share
/// across concurrent requests; writes are plain overwrites.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored value, or `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key` for `ttl_secs` seconds
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError>;

    /// Removes every entry
    async fn clear(&self) -> Result<(), StoreError>;

    /// Short backend name used in logs
    fn backend(&self) -> &'static str;
}

/// Converts a TTL in seconds to a chrono duration, saturating at chrono's range
pub(crate) fn ttl_duration(ttl_secs: u64) -> Duration {
    let max_secs = i64::MAX / 1000;
    Duration::seconds(i64::try_from(ttl_secs).unwrap_or(max_secs).min(max_secs))
}

/// Builds the cache key for an endpoint path and username
///
/// The leading slash of the path is dropped, so `/github` and `torvalds`
/// become `github:torvalds`.
pub fn cache_key(path: &str, username: &str) -> String {
    format!("{}:{}", path.trim_start_matches('/'), username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_strips_leading_slash() {
        assert_eq!(cache_key("/github", "torvalds"), "github:torvalds");
        assert_eq!(cache_key("/analyze", "octocat"), "analyze:octocat");
    }

    #[test]
    fn test_cache_key_without_slash_is_unchanged() {
        assert_eq!(cache_key("github", "torvalds"), "github:torvalds");
    }

    #[test]
    fn test_ttl_duration_saturates() {
        assert_eq!(ttl_duration(1800), Duration::seconds(1800));
        assert_eq!(ttl_duration(u64::MAX), Duration::seconds(i64::MAX / 1000));
    }

    #[test]
    fn test_cache_keys_differ_per_endpoint() {
        assert_ne!(cache_key("/github", "a"), cache_key("/analyze", "a"));
    }
}
