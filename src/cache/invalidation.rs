//! Post-commit cache eviction.
//!
//! Maps committed-write events onto the named aggregate caches:
//!
//! - any asset write evicts `active_assets` and `asset_summary_cache`,
//!   plus `disposed_assets` when the affected asset is disposed;
//! - any reference-entity write evicts `asset_summary_cache` only
//!   (summaries are grouped by those dimensions);
//! - a completed bulk import evicts all three unconditionally.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheBackend, CacheError, ACTIVE_ASSETS, ASSET_SUMMARY, DISPOSED_ASSETS};
use crate::events::Event;

#[derive(Clone)]
pub struct CacheInvalidator {
    cache: Arc<dyn CacheBackend>,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self { cache }
    }

    pub async fn handle(&self, event: &Event) -> Result<(), CacheError> {
        match event {
            Event::AssetCreated { asset_id, disposed }
            | Event::AssetUpdated { asset_id, disposed }
            | Event::AssetDeleted { asset_id, disposed } => {
                debug!(asset_id, "Evicting asset caches");
                self.cache.delete(ACTIVE_ASSETS).await?;
                self.cache.delete(ASSET_SUMMARY).await?;
                if *disposed {
                    self.cache.delete(DISPOSED_ASSETS).await?;
                }
            }
            Event::ReferenceChanged { kind, id } => {
                debug!(?kind, id, "Evicting summary cache");
                self.cache.delete(ASSET_SUMMARY).await?;
            }
            Event::ImportCompleted { created, updated } => {
                debug!(created, updated, "Evicting all asset caches after import");
                self.cache.delete(ACTIVE_ASSETS).await?;
                self.cache.delete(DISPOSED_ASSETS).await?;
                self.cache.delete(ASSET_SUMMARY).await?;
            }
        }
        Ok(())
    }
}
