//! Service Catalog API (公共路由)

use axum::{Json, Router, extract::State, routing::get};
use shared::models::ServiceCatalog;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/services", get(list))
}

/// 服务类型、区域与并发容量
async fn list(State(state): State<ServerState>) -> Json<ServiceCatalog> {
    Json(state.queue.catalog().clone())
}
