//! Shared types for the restaurant queue service
//!
//! Domain models, API DTOs, real-time event payloads, the unified
//! error system and time helpers used by queue-server and its clients.

pub mod client;
pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

// Event re-exports (for convenient access)
pub use message::{QueueEvent, Topic};
