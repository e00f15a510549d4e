//! Domain events emitted by the write paths.
//!
//! Services send an event only after a successful commit; the processing
//! loop fans events into the cache invalidator. Eviction therefore never
//! runs ahead of a write that might still roll back.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::cache::invalidation::CacheInvalidator;

/// Reference entity kinds whose writes feed the summary cache eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceKind {
    Department,
    Employee,
    Supplier,
    Location,
    MajorCategory,
    MinorCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    AssetCreated { asset_id: i64, disposed: bool },
    AssetUpdated { asset_id: i64, disposed: bool },
    AssetDeleted { asset_id: i64, disposed: bool },
    ReferenceChanged { kind: ReferenceKind, id: i64 },
    ImportCompleted { created: usize, updated: usize },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event to the processing loop. A send failure means the
    /// receiver is gone; the write itself has already committed, so this
    /// is logged rather than propagated.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            error!("Failed to send event: {}", e);
        }
    }
}

/// Background loop distributing committed-write events to subscribers.
/// Currently the only subscriber is the cache invalidator.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, invalidator: CacheInvalidator) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        debug!("Received event: {:?}", event);
        if let Err(e) = invalidator.handle(&event).await {
            error!("Cache invalidation failed for {:?}: {}", event, e);
        }
    }

    info!("Event processing loop stopped");
}
