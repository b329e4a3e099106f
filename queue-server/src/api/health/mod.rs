//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/health | GET | 健康检查 | 无 |
//!
//! ```json
//! {
//!   "status": "ok", "version": "0.1.0", "uptime_seconds": 42, "total_waiting": 3,
//!   "storage": { "entry_count": 5, "history_count": 12, "last_entry_id": 9 }
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use shared::client::{HealthResponse, StorageHealth};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    // 存储不可读时仍返回 200，由 status 区分
    let storage = match state.queue.storage_stats() {
        Ok(stats) => Some(StorageHealth {
            entry_count: stats.entry_count,
            history_count: stats.history_count,
            last_entry_id: stats.last_entry_id,
        }),
        Err(e) => {
            tracing::error!(error = %e, "Health check could not read storage stats");
            None
        }
    };
    Json(HealthResponse {
        status: if storage.is_some() { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        total_waiting: state.queue.snapshot().total_waiting,
        storage,
    })
}
