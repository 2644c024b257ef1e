//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use ttl_store::{api::create_router, AppState, CacheEvent, Config};

// == Helper Functions ==

fn create_test_app() -> Router {
    create_router(AppState::from_config(&Config::default()))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn put(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, "PUT", "/set", Some(body)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None).await
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app();

    let (status, json) = put(&app, json!({"key": "test_key", "value": "test_value"})).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("test_key"));
    assert_eq!(json["stored"], true);
}

#[tokio::test]
async fn test_set_endpoint_accepts_any_json_value() {
    let app = create_test_app();

    let value = json!({"user": {"id": 7, "tags": ["a", "b"]}});
    put(&app, json!({"key": "doc", "value": value.clone()})).await;

    let (status, json) = get(&app, "/get/doc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], value);
}

#[tokio::test]
async fn test_set_endpoint_never_rejects_ttl() {
    let app = create_test_app();

    for ttl in [json!(60_000), json!("60000"), json!(null), json!("soon"), json!({"ms": 1})] {
        let (status, _) = put(&app, json!({"key": "k", "value": 1, "ttl": ttl})).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_set_endpoint_negative_ttl() {
    let app = create_test_app();
    put(&app, json!({"key": "k", "value": "old"})).await;

    let (status, json) = put(&app, json!({"key": "k", "value": "new", "ttl": -1})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stored"], false);
    let (status, _) = get(&app, "/get/k").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_set_endpoint_invalid_request() {
    let app = create_test_app();

    let (status, json) = put(&app, json!({"key": "", "value": "test"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_set_endpoint_key_too_long() {
    let app = create_test_app();

    let key = "x".repeat(Config::default().max_key_length + 1);
    let (status, _) = put(&app, json!({"key": key, "value": "test"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// == GET / HAS Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app();
    put(&app, json!({"key": "get_key", "value": "get_value"})).await;

    let (status, json) = get(&app, "/get/get_key").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "get_key");
    assert_eq!(json["value"], "get_value");
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let (status, json) = get(&app, "/get/nonexistent_key").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_has_endpoint() {
    let app = create_test_app();
    put(&app, json!({"key": "present", "value": 1})).await;

    let (_, json) = get(&app, "/has/present").await;
    assert_eq!(json["present"], true);

    let (status, json) = get(&app, "/has/absent").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["present"], false);
}

// == DELETE / CLEAR Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint() {
    let app = create_test_app();
    put(&app, json!({"key": "delete_key", "value": "delete_value"})).await;

    let (status, json) = send(&app, "DELETE", "/del/delete_key", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted"], true);

    let (status, _) = get(&app, "/get/delete_key").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_missing_key() {
    let app = create_test_app();

    let (status, json) = send(&app, "DELETE", "/del/nonexistent_key", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted"], false);
}

#[tokio::test]
async fn test_clear_endpoint_is_idempotent() {
    let app = create_test_app();
    put(&app, json!({"key": "a", "value": 1, "ttl": 5000})).await;
    put(&app, json!({"key": "b", "value": 2})).await;

    for _ in 0..2 {
        let (status, _) = send(&app, "DELETE", "/clear", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, json) = get(&app, "/size").await;
        assert_eq!(json["size"], 0);
    }
}

// == SIZE / KEYS Endpoint Tests ==

#[tokio::test]
async fn test_size_and_keys_endpoints() {
    let app = create_test_app();
    for key in ["charlie", "alpha", "bravo"] {
        put(&app, json!({"key": key, "value": key})).await;
    }

    let (_, json) = get(&app, "/size").await;
    assert_eq!(json["size"], 3);

    let (_, json) = get(&app, "/keys").await;
    assert_eq!(json["keys"], json!(["alpha", "bravo", "charlie"]));
}

// == TTL Expiration via API Tests ==

#[tokio::test(start_paused = true)]
async fn test_ttl_expiration_via_api() {
    let app = create_test_app();

    put(&app, json!({"key": "ttl_test", "value": "expires_soon", "ttl": 1000})).await;

    let (status, _) = get(&app, "/get/ttl_test").await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::advance(Duration::from_millis(1000)).await;

    let (status, _) = get(&app, "/get/ttl_test").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_string_ttl_via_api() {
    let app = create_test_app();

    put(&app, json!({"key": "k", "value": 1, "ttl": "10"})).await;

    tokio::time::advance(Duration::from_millis(9)).await;
    let (_, json) = get(&app, "/has/k").await;
    assert_eq!(json["present"], true);

    tokio::time::advance(Duration::from_millis(1)).await;
    let (_, json) = get(&app, "/has/k").await;
    assert_eq!(json["present"], false);
}

#[tokio::test(start_paused = true)]
async fn test_ttl_endpoint() {
    let app = create_test_app();
    put(&app, json!({"key": "exp", "value": 1, "ttl": 100})).await;
    put(&app, json!({"key": "perm", "value": 1})).await;

    tokio::time::advance(Duration::from_millis(40)).await;

    let (status, json) = get(&app, "/ttl/exp").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ttl_ms"], 60.0);

    let (_, json) = get(&app, "/ttl/perm").await;
    assert!(json["ttl_ms"].is_null());

    let (status, _) = get(&app, "/ttl/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == Event Bus Tests ==

#[tokio::test]
async fn test_mutations_publish_events() {
    let state = AppState::from_config(&Config::default());
    let mut events = state.events.subscribe();
    let app = create_router(state);

    put(&app, json!({"key": "k", "value": 1, "ttl": 250})).await;
    send(&app, "DELETE", "/del/k", None).await;
    send(&app, "DELETE", "/del/k", None).await;
    send(&app, "DELETE", "/clear", None).await;

    assert_eq!(
        events.recv().await.unwrap(),
        CacheEvent::Set {
            key: "k".to_string(),
            ttl_ms: Some(250.0)
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        CacheEvent::Deleted {
            key: "k".to_string()
        }
    );
    // The second delete removed nothing and published nothing
    assert_eq!(events.recv().await.unwrap(), CacheEvent::Cleared);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
