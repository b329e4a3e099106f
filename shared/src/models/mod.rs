//! Data models
//!
//! Shared between queue-server and its clients (via API and WebSocket).
//! Entry ids are `u64`, timestamps are Unix milliseconds (`i64`).

pub mod analytics;
pub mod entry;
pub mod history;
pub mod service;
pub mod settings;
pub mod snapshot;

// Re-exports
pub use analytics::*;
pub use entry::*;
pub use history::*;
pub use service::*;
pub use settings::*;
pub use snapshot::*;
