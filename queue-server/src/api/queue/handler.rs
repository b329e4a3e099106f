//! Queue API Handlers

use axum::{Json, extract::State};
use serde::Deserialize;
use shared::models::{Entry, EntryFilter, EntryStatus, QueueSnapshot, ServiceType};
use shared::util::now_millis;

use crate::api::extract::AppQuery;
use crate::core::ServerState;

/// 队列快照 (读取最近一次提交，不阻塞写入；`last_updated` 为响应时间)
pub async fn status(State(state): State<ServerState>) -> Json<QueueSnapshot> {
    Json(state.queue.snapshot_at(now_millis()))
}

/// Query params for listing entries
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<EntryStatus>,
    pub service_type: Option<ServiceType>,
    pub location: Option<String>,
}

/// 全部记录，按 FIFO 顺序
pub async fn list(
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Json<Vec<Entry>> {
    let filter = EntryFilter {
        status: query.status,
        service_type: query.service_type,
        location: query.location,
    };
    Json(state.queue.list(&filter))
}
