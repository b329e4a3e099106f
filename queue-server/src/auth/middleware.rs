//! 认证中间件
//!
//! 为管理员会话认证提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::Method;
use shared::error::AppError;
use shared::util::now_millis;

use crate::auth::SessionStore;
use crate::core::ServerState;
use crate::security_log;

/// 无需会话的 API 路由
///
/// | 方法 | 路径 |
/// |------|------|
/// | POST | /api/reservations |
/// | GET | /api/reservations/{id} |
/// | GET | /api/queue/status |
/// | GET | /api/services |
/// | GET | /api/health |
/// | GET | /api/ws |
/// | POST | /api/admin/login |
pub fn is_public_route(method: &Method, path: &str) -> bool {
    match path {
        "/api/reservations" => method == Method::POST,
        "/api/queue/status" | "/api/services" | "/api/health" | "/api/ws" => {
            method == Method::GET
        }
        "/api/admin/login" => method == Method::POST,
        _ => method == Method::GET && path.starts_with("/api/reservations/"),
    }
}

/// 认证中间件 - 要求管理员会话
///
/// 从 `Authorization: Bearer <session_id>` 头提取并校验会话。
/// 校验成功后将 [`AdminSession`](crate::auth::AdminSession) 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - [`is_public_route`] 列出的公共路由
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 / 未知会话 | 401 NotAuthenticated |
/// | 会话过期 | 401 SessionExpired |
pub async fn require_admin(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if is_public_route(req.method(), path) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => SessionStore::extract_from_header(header).ok_or_else(|| {
            security_log!("WARN", "auth_malformed", uri = req.uri().to_string());
            AppError::unauthorized()
        })?,
        None => {
            security_log!("WARN", "auth_missing", uri = req.uri().to_string());
            return Err(AppError::unauthorized());
        }
    };

    match state.auth.sessions().validate(token, now_millis()) {
        Ok(session) => {
            req.extensions_mut().insert(session);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = req.uri().to_string()
            );
            Err(AppError::from(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes() {
        assert!(is_public_route(&Method::POST, "/api/reservations"));
        assert!(is_public_route(&Method::GET, "/api/reservations/12"));
        assert!(is_public_route(&Method::GET, "/api/queue/status"));
        assert!(is_public_route(&Method::POST, "/api/admin/login"));
        assert!(is_public_route(&Method::GET, "/api/ws"));

        assert!(!is_public_route(&Method::GET, "/api/reservations"));
        assert!(!is_public_route(&Method::GET, "/api/queue"));
        assert!(!is_public_route(&Method::POST, "/api/admin/logout"));
        assert!(!is_public_route(&Method::PUT, "/api/admin/queue/1"));
        assert!(!is_public_route(&Method::GET, "/api/analytics"));
        assert!(!is_public_route(&Method::GET, "/api/admin/settings"));
    }
}
