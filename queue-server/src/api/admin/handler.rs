//! Admin API Handlers

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use shared::client::{LoginRequest, LoginResponse, MessageResponse};
use shared::error::{AppError, AppResult};
use shared::models::{Entry, EntryStatus, EntryStatusUpdate};
use shared::util::now_millis;
use validator::Validate;

use crate::api::extract::{AppJson, AppPath, AppQuery, ValidatedJson};
use crate::auth::AdminSession;
use crate::core::ServerState;

/// 登录
pub async fn login(
    State(state): State<ServerState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    if payload.password.is_empty() {
        return Err(AppError::invalid_field("password", "Password is required"));
    }
    let session = state.auth.login(&payload.password, now_millis())?;
    Ok(Json(LoginResponse {
        session_id: session.session_id,
        expires_at: session.expires_at,
    }))
}

/// 注销
pub async fn logout(
    State(state): State<ServerState>,
    session: AdminSession,
) -> Json<MessageResponse> {
    state.auth.logout(&session.session_id);
    Json(MessageResponse::new("Logged out successfully"))
}

/// `PUT /api/admin/queue/{id}` body
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEntryRequest {
    pub status: EntryStatus,
    #[validate(length(max = 500, message = "notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// 修改状态/备注
pub async fn update_entry(
    State(state): State<ServerState>,
    session: AdminSession,
    AppPath(id): AppPath<u64>,
    ValidatedJson(payload): ValidatedJson<UpdateEntryRequest>,
) -> AppResult<Json<Entry>> {
    tracing::debug!(
        entry_id = id,
        status = %payload.status,
        session = %session.fingerprint(),
        "Admin entry update"
    );
    let entry = state.queue.set_status(
        id,
        EntryStatusUpdate {
            status: payload.status,
            notes: payload.notes,
        },
    )?;
    Ok(Json(entry))
}

/// 硬删除
pub async fn delete_entry(
    State(state): State<ServerState>,
    AppPath(id): AppPath<u64>,
) -> AppResult<StatusCode> {
    state.queue.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "json".to_string()
}

/// 导出 (JSON 附件)
pub async fn export(
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    if query.format != "json" {
        return Err(AppError::invalid_field(
            "format",
            format!("Unsupported export format: {}", query.format),
        ));
    }
    let bundle = state.queue.export()?;
    tracing::info!(
        entries = bundle.entries.len(),
        history = bundle.service_history.len(),
        "Queue data exported"
    );
    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"reservations.json\"",
        )],
        Json(bundle),
    ))
}
