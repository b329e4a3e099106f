//! Session 提取器
//!
//! 从请求中取出 [`require_admin`](super::require_admin) 已验证的
//! [`AdminSession`]；中间件不在栈中时自行验证请求头。

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::error::AppError;
use shared::util::now_millis;

use crate::auth::{AdminSession, SessionStore};
use crate::core::ServerState;
use crate::security_log;

impl FromRequestParts<ServerState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<AdminSession>() {
            return Ok(session.clone());
        }

        let token = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(SessionStore::extract_from_header)
            .ok_or_else(|| {
                security_log!("WARN", "auth_missing", uri = parts.uri.to_string());
                AppError::unauthorized()
            })?;

        let session = state.auth.sessions().validate(token, now_millis())?;
        parts.extensions.insert(session.clone());
        Ok(session)
    }
}
