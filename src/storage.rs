//! Storage Layer Module
//!
//! Read-through / write-through caching in front of a durable key/value
//! backend. The `TtlStore` is used as a plain collaborator here and has no
//! knowledge of the backend.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use crate::cache::{RawTtl, TtlStore};
use crate::error::StorageError;

// == Storage Trait ==
/// A durable key/value backend.
pub trait Storage: Send + Sync {
    /// Loads the value stored under `key`.
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError>;

    /// Removes `key`. Returns whether it was present.
    fn remove(&self, key: &str) -> Result<bool, StorageError>;
}

// == Memory Storage ==
/// In-process `Storage` backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.records.write().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.records.write().remove(key).is_some())
    }
}

// == Cached Storage ==
/// Serves reads from a `TtlStore`, falling back to `storage` on a miss and
/// writing every update through to `storage`.
pub struct CachedStorage<S> {
    cache: TtlStore<String, Value>,
    storage: S,
    ttl: RawTtl,
}

impl<S: Storage> CachedStorage<S> {
    /// Creates a layer whose cached copies live for `ttl` milliseconds.
    ///
    /// `ttl` follows the same rules as `TtlStore::set`.
    pub fn new(storage: S, ttl: impl Into<RawTtl>) -> Self {
        Self {
            cache: TtlStore::new(),
            storage,
            ttl: ttl.into(),
        }
    }

    /// Creates a layer on top of an existing store.
    pub fn with_cache(cache: TtlStore<String, Value>, storage: S, ttl: impl Into<RawTtl>) -> Self {
        Self {
            cache,
            storage,
            ttl: ttl.into(),
        }
    }

    /// Reads `key`, loading and caching it from storage on a miss.
    pub fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        if let Some(value) = self.cache.get(key) {
            return Ok(Some(value));
        }

        let loaded = self.storage.load(key)?;
        if let Some(value) = &loaded {
            self.cache
                .set(key.to_string(), value.clone(), self.ttl.clone());
        }
        Ok(loaded)
    }

    /// Writes `value` to storage, then caches it.
    ///
    /// The cache is left untouched if the write fails.
    pub fn put(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.storage.save(key, &value)?;
        self.cache.set(key.to_string(), value, self.ttl.clone());
        Ok(())
    }

    /// Removes `key` from the cache and from storage.
    pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.cache.delete(key);
        self.storage.remove(key)
    }

    /// The cache in front of the backend.
    pub fn cache(&self) -> &TtlStore<String, Value> {
        &self.cache
    }

    /// The backend behind the cache.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts loads so tests can tell cache hits from backend reads.
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        loads: AtomicUsize,
    }

    impl Storage for CountingStorage {
        fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(key)
        }

        fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
            self.inner.save(key, value)
        }

        fn remove(&self, key: &str) -> Result<bool, StorageError> {
            self.inner.remove(key)
        }
    }

    struct OfflineStorage;

    impl Storage for OfflineStorage {
        fn load(&self, _key: &str) -> Result<Option<Value>, StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }

        fn save(&self, _key: &str, _value: &Value) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }

        fn remove(&self, _key: &str) -> Result<bool, StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.save("k", &json!(1)).unwrap();
        assert_eq!(storage.load("k").unwrap(), Some(json!(1)));
        assert_eq!(storage.len(), 1);

        assert!(storage.remove("k").unwrap());
        assert!(!storage.remove("k").unwrap());
    }

    #[test]
    fn test_read_through_populates_cache() {
        let storage = CountingStorage::default();
        storage.inner.save("user:1", &json!({"name": "ada"})).unwrap();
        let layer = CachedStorage::new(storage, ());

        assert_eq!(layer.get("user:1").unwrap(), Some(json!({"name": "ada"})));
        assert_eq!(layer.get("user:1").unwrap(), Some(json!({"name": "ada"})));

        assert_eq!(layer.storage().loads.load(Ordering::SeqCst), 1);
        assert!(layer.cache().has("user:1"));
    }

    #[test]
    fn test_miss_in_both_layers() {
        let layer = CachedStorage::new(MemoryStorage::new(), 1000);

        assert_eq!(layer.get("missing").unwrap(), None);
        assert_eq!(layer.cache().size(), 0);
    }

    #[test]
    fn test_write_through() {
        let layer = CachedStorage::new(MemoryStorage::new(), ());

        layer.put("k", json!("v")).unwrap();

        assert_eq!(layer.storage().load("k").unwrap(), Some(json!("v")));
        assert_eq!(layer.cache().get("k"), Some(json!("v")));
    }

    #[test]
    fn test_remove_from_both_layers() {
        let layer = CachedStorage::new(MemoryStorage::new(), ());
        layer.put("k", json!("v")).unwrap();

        assert!(layer.remove("k").unwrap());

        assert!(!layer.cache().has("k"));
        assert_eq!(layer.get("k").unwrap(), None);
    }

    #[test]
    fn test_failed_write_is_not_cached() {
        let layer = CachedStorage::new(OfflineStorage, ());

        assert!(layer.put("k", json!("v")).is_err());
        assert!(!layer.cache().has("k"));
    }

    #[test]
    fn test_load_error_propagates() {
        let layer = CachedStorage::new(OfflineStorage, ());

        assert_eq!(
            layer.get("k"),
            Err(StorageError::Unavailable("offline".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_copy_is_reloaded() {
        let storage = CountingStorage::default();
        storage.inner.save("k", &json!("v1")).unwrap();
        let layer = CachedStorage::new(storage, 50);

        assert_eq!(layer.get("k").unwrap(), Some(json!("v1")));
        layer.storage().inner.save("k", &json!("v2")).unwrap();

        tokio::time::advance(Duration::from_millis(50)).await;

        assert_eq!(layer.get("k").unwrap(), Some(json!("v2")));
        assert_eq!(layer.storage().loads.load(Ordering::SeqCst), 2);
    }
}
