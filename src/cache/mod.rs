//! Cache Module
//!
//! Provides the in-process TTL store and its building blocks.

mod entry;
mod store;
mod timer;
pub mod ttl;


// Re-export public types
pub use entry::Entry;
pub use store::TtlStore;
pub use ttl::{normalize_ttl, RawTtl, Ttl};
