//! Configuration Module
//!
//! Handles loading server configuration from environment variables. The TTL
//! store itself needs no configuration; TTLs are chosen per call.

use std::env;
use std::str::FromStr;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum key length in bytes
    pub max_key_length: usize,
    /// Maximum serialized value size in bytes
    pub max_value_size: usize,
    /// Number of events buffered per event-bus subscriber
    pub event_capacity: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MAX_KEY_LENGTH` - Maximum key length in bytes (default: 256)
    /// - `MAX_VALUE_SIZE` - Maximum serialized value size in bytes (default: 1 MiB)
    /// - `EVENT_CAPACITY` - Event bus buffer per subscriber (default: 1024)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            max_key_length: env_or("MAX_KEY_LENGTH", defaults.max_key_length),
            max_value_size: env_or("MAX_VALUE_SIZE", defaults.max_value_size),
            event_capacity: env_or("EVENT_CAPACITY", defaults.event_capacity).max(1),
        }
    }
}

/// Reads and parses `name`, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            max_key_length: 256,
            max_value_size: 1024 * 1024,
            event_capacity: 1024,
        }
    }
}
