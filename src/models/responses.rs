//! Response DTOs for the store API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Human-readable outcome
    pub message: String,
    /// The key that was set
    pub key: String,
    /// False when a negative TTL caused the key to be removed instead
    pub stored: bool,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, stored: bool) -> Self {
        let key = key.into();
        let message = if stored {
            format!("Key '{}' set successfully", key)
        } else {
            format!("Key '{}' not stored: negative TTL", key)
        };
        Self {
            message,
            key,
            stored,
        }
    }
}

/// Response body for the HAS operation (GET /has/:key)
#[derive(Debug, Clone, Serialize)]
pub struct HasResponse {
    pub key: String,
    pub present: bool,
}

/// Response body for the TTL lookup (GET /ttl/:key)
#[derive(Debug, Clone, Serialize)]
pub struct TtlResponse {
    pub key: String,
    /// Remaining milliseconds, null for entries that never expire
    pub ttl_ms: Option<f64>,
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// The key that was targeted
    pub key: String,
    /// Whether an entry was present before removal
    pub deleted: bool,
}

/// Response body for the CLEAR operation (DELETE /clear)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn cleared() -> Self {
        Self {
            message: "Store cleared".to_string(),
        }
    }
}

/// Response body for GET /size
#[derive(Debug, Clone, Serialize)]
pub struct SizeResponse {
    /// Number of live entries
    pub size: usize,
}

/// Response body for GET /keys
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    /// Live keys, sorted
    pub keys: Vec<String>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
