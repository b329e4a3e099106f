//! Analytics Handlers

use axum::{Json, extract::State};
use shared::models::{AnalyticsSummary, HourlyWait};
use shared::util::now_millis;

use crate::core::ServerState;

pub async fn summary(State(state): State<ServerState>) -> Json<AnalyticsSummary> {
    Json(state.queue.analytics(now_millis()))
}

pub async fn wait_times(State(state): State<ServerState>) -> Json<Vec<HourlyWait>> {
    Json(state.queue.wait_times())
}
