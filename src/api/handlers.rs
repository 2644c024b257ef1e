//! API Handlers
//!
//! HTTP request handlers exposing each store operation. Handlers publish a
//! `CacheEvent` after every mutation; the store itself stays silent.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{normalize_ttl, ttl::duration_to_millis, Ttl, TtlStore};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::events::{CacheEvent, EventBus};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HasResponse, HealthResponse, KeysResponse,
    SetRequest, SetResponse, SizeResponse, TtlResponse,
};

/// Application state shared across all handlers.
///
/// The store synchronizes internally, so it is shared by clone rather than
/// behind an outer lock.
#[derive(Clone)]
pub struct AppState {
    /// Shared TTL store
    pub store: TtlStore<String, Value>,
    /// Activity notifications
    pub events: EventBus,
    /// Request limits
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new AppState around the given store.
    pub fn new(store: TtlStore<String, Value>, config: Config) -> Self {
        Self {
            store,
            events: EventBus::new(config.event_capacity),
            config: Arc::new(config),
        }
    }

    /// Creates a new AppState with an empty store.
    ///
    /// Must be called from within a tokio runtime so that scheduled removals
    /// have somewhere to run.
    pub fn from_config(config: &Config) -> Self {
        Self::new(TtlStore::new(), config.clone())
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair with an optional TTL in milliseconds.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate(state.config.max_key_length, state.config.max_value_size)
    {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let raw_ttl = req.raw_ttl();
    let policy = normalize_ttl(&raw_ttl);
    state.store.set(req.key.clone(), req.value, raw_ttl);

    let event = match policy {
        Some(Ttl::Negative) => CacheEvent::Rejected {
            key: req.key.clone(),
        },
        Some(Ttl::Expires(ttl)) => CacheEvent::Set {
            key: req.key.clone(),
            ttl_ms: Some(duration_to_millis(ttl)),
        },
        None => CacheEvent::Set {
            key: req.key.clone(),
            ttl_ms: None,
        },
    };
    state.events.publish(event);

    let stored = !matches!(policy, Some(Ttl::Negative));
    Ok(Json(SetResponse::new(req.key, stored)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value by key. Missing and expired keys are both 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .store
        .get(&key)
        .ok_or_else(|| ApiError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<HasResponse> {
    let present = state.store.has(&key);
    Json(HasResponse { key, present })
}

/// Handler for GET /ttl/:key
///
/// Reports the remaining lifetime in milliseconds, or null for permanent
/// entries.
pub async fn ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TtlResponse>> {
    let remaining = state
        .store
        .ttl_remaining(&key)
        .ok_or_else(|| ApiError::NotFound(key.clone()))?;

    Ok(Json(TtlResponse {
        key,
        ttl_ms: remaining.map(duration_to_millis),
    }))
}

/// Handler for DELETE /del/:key
///
/// Deleting a missing key is not an error; `deleted` reports whether anything
/// was removed.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    let deleted = state.store.delete(&key);
    if deleted {
        state.events.publish(CacheEvent::Deleted { key: key.clone() });
    }

    Json(DeleteResponse { key, deleted })
}

/// Handler for DELETE /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.store.clear();
    state.events.publish(CacheEvent::Cleared);

    Json(ClearResponse::cleared())
}

/// Handler for GET /size
pub async fn size_handler(State(state): State<AppState>) -> Json<SizeResponse> {
    Json(SizeResponse {
        size: state.store.size(),
    })
}

/// Handler for GET /keys
///
/// Keys are sorted so that responses are stable.
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    let mut keys = state.store.keys();
    keys.sort_unstable();
    Json(KeysResponse { keys })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
