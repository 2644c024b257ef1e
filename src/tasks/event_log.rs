//! Event Logger Task
//!
//! Background task that records store activity published on the event bus.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::events::{CacheEvent, EventBus};

/// Spawns a task that logs every event published on `bus`.
///
/// The subscription is taken before this function returns, so no event
/// published afterwards is missed. The task ends when every sender has been
/// dropped.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_event_logger(bus: &EventBus) -> JoinHandle<()> {
    let mut events = bus.subscribe();

    tokio::spawn(async move {
        info!("Starting event logger");

        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event logger lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => {
                    debug!("Event bus closed, stopping event logger");
                    break;
                }
            }
        }
    })
}

fn log_event(event: &CacheEvent) {
    match event {
        CacheEvent::Set {
            key,
            ttl_ms: Some(ttl),
        } => info!(key = %key, ttl_ms = ttl, "key set"),
        CacheEvent::Set { key, ttl_ms: None } => info!(key = %key, "key set without expiration"),
        CacheEvent::Rejected { key } => debug!(key = %key, "negative ttl, key removed"),
        CacheEvent::Deleted { key } => info!(key = %key, "key deleted"),
        CacheEvent::Cleared => info!("store cleared"),
    }
}
