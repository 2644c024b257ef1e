//! API Module
//!
//! HTTP handlers and routing for the store's REST front end.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `GET /has/:key` - Check whether a key is live
//! - `GET /ttl/:key` - Remaining lifetime of a key
//! - `DELETE /del/:key` - Delete a key
//! - `DELETE /clear` - Remove every key
//! - `GET /size` - Number of live keys
//! - `GET /keys` - Live keys
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
