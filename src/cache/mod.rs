//! In-process cache for expensive aggregate views.
//!
//! The cache is injected as a dependency wherever it is read or evicted;
//! there are no module-level globals. Entries carry a TTL backstop, but
//! the primary freshness mechanism is eager post-commit invalidation (see
//! `invalidation`).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use thiserror::Error;

pub mod invalidation;

/// Cached id list of non-disposed assets.
pub const ACTIVE_ASSETS: &str = "active_assets";
/// Cached id list of disposed assets.
pub const DISPOSED_ASSETS: &str = "disposed_assets";
/// Cached summary-statistics blob.
pub const ASSET_SUMMARY: &str = "asset_summary_cache";

/// TTL backstop for all aggregate views.
pub const AGGREGATE_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
}

#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn clear(&self) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Instant::now() > expires_at,
            None => false,
        }
    }
}

/// Process-wide in-memory cache. Swap for a shared store behind the same
/// trait if the deployment becomes multi-process.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_locked(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, CacheEntry>>, CacheError> {
        self.store
            .read()
            .map_err(|_| CacheError::OperationFailed("cache lock poisoned".into()))
    }

    fn write_locked(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, CacheEntry>>, CacheError> {
        self.store
            .write()
            .map_err(|_| CacheError::OperationFailed("cache lock poisoned".into()))
    }
}

#[async_trait::async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let expired = {
            let store = self.read_locked()?;
            match store.get(key) {
                Some(entry) if entry.is_expired() => true,
                Some(entry) => return Ok(Some(entry.value.clone())),
                None => return Ok(None),
            }
        };
        if expired {
            self.write_locked()?.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.write_locked()?
            .insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.write_locked()?.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.write_locked()?.clear();
        Ok(())
    }
}
