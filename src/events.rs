//! Event Bus Module
//!
//! Broadcast channel for store activity notifications. The store never
//! publishes on its own; callers wrapping it (the HTTP handlers here) publish
//! around their store calls.

use serde::Serialize;
use tokio::sync::broadcast;

// == Cache Event ==
/// Notification describing a completed store operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CacheEvent {
    /// A key was written. `ttl_ms` is None for permanent entries.
    Set { key: String, ttl_ms: Option<f64> },
    /// A write with a negative TTL removed the key instead of storing it
    Rejected { key: String },
    /// A key was deleted
    Deleted { key: String },
    /// The store was cleared
    Cleared,
}

// == Event Bus ==
/// Fan-out channel for `CacheEvent`s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CacheEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event. Returns the number of subscribers reached.
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: CacheEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribes to all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
