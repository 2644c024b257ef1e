//! Request DTOs for the store API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::RawTtl;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in milliseconds. Numbers and numeric strings are
///   honored; null, absent or anything else means no expiration.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Raw TTL exactly as sent by the client
    #[serde(default)]
    pub ttl: Option<Value>,
}

impl SetRequest {
    /// Validates the request data against the configured limits.
    ///
    /// Returns an error message if validation fails, None if valid. The TTL
    /// is never validated; it is normalized by the store.
    pub fn validate(&self, max_key_length: usize, max_value_size: usize) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > max_key_length {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                max_key_length
            ));
        }
        if self.value.to_string().len() > max_value_size {
            return Some(format!(
                "Value exceeds maximum size of {} bytes",
                max_value_size
            ));
        }
        None
    }

    /// The TTL in the form the store accepts.
    pub fn raw_ttl(&self) -> RawTtl {
        RawTtl::from(self.ttl.clone())
    }
}
