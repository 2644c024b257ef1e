//! TTL Store - an in-process key/value store with expiring entries
//!
//! Entries expire through two independent paths: a removal task scheduled on
//! the tokio runtime, and a check against the monotonic clock on every read.
//! An HTTP front end, an event bus and a read-through storage layer are built
//! on top of the store without it knowing about them.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use cache::{RawTtl, TtlStore};
pub use config::Config;
pub use events::{CacheEvent, EventBus};
pub use tasks::spawn_event_logger;
