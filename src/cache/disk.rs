//! On-disk cache store
//!
//! Stores each entry as a JSON file with its insertion and expiry timestamps
//! in an XDG-compliant cache directory (`~/.cache/profile-edge/` on Linux).
//! Expired files are treated as absent and removed on read.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::clock::{Clock, SystemClock};
use super::store::{ttl_duration, CacheStore, StoreError};

/// Wrapper struct for a cached payload stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct DiskEntry {
    /// Serialized response body
    value: String,
    /// When the payload was cached
    cached_at: DateTime<Utc>,
    /// When the entry stops being served
    expires_at: DateTime<Utc>,
}

/// Cache store persisting entries as JSON files
#[derive(Debug, Clone)]
pub struct DiskStore {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl DiskStore {
    /// Creates a DiskStore in the XDG cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "profile-edge")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a DiskStore rooted at `cache_dir`
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source used for expiry checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to the cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Escapes a cache key into a portable file name
///
/// Alphanumerics, `-` and `_` pass through; everything else (including the
/// `:` separator) becomes `%XX`, so distinct keys never share a file.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => stem.push(byte as char),
            other => stem.push_str(&format!("%{other:02X}")),
        }
    }
    stem
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.cache_path(key);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: DiskEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding unreadable disk cache entry");
                let _ = fs::remove_file(&path).await;
                return Ok(None);
            }
        };

        if self.clock.now() >= entry.expires_at {
            let _ = fs::remove_file(&path).await;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        fs::create_dir_all(&self.cache_dir).await?;

        let now = self.clock.now();
        let entry = DiskEntry {
            value: value.to_string(),
            cached_at: now,
            expires_at: now
                .checked_add_signed(ttl_duration(ttl_secs))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let json = serde_json::to_string(&entry)?;
        fs::write(self.cache_path(key), json).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut dir = match fs::read_dir(&self.cache_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(path).await?;
            }
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "disk"
    }
}
