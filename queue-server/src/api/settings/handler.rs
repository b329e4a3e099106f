//! Admin Settings Handlers

use axum::{Json, extract::State};
use shared::error::AppResult;
use shared::models::{AdminSettings, AdminSettingsUpdate};

use crate::api::extract::AppJson;
use crate::core::ServerState;

pub async fn get_settings(State(state): State<ServerState>) -> Json<AdminSettings> {
    Json(state.queue.settings())
}

/// 部分更新，校验失败时不修改任何字段
pub async fn update_settings(
    State(state): State<ServerState>,
    AppJson(payload): AppJson<AdminSettingsUpdate>,
) -> AppResult<Json<AdminSettings>> {
    Ok(Json(state.queue.update_settings(payload)?))
}
