//! Background Tasks Module
//!
//! Contains background tasks that run alongside the server.
//!
//! # Tasks
//! - Event Logger: Writes every event-bus notification to the tracing log

mod event_log;

pub use event_log::spawn_event_logger;
