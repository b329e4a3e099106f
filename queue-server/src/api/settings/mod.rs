//! Admin Settings API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/admin/settings | GET | 当前设置 | 管理员 |
//! | /api/admin/settings | PUT | 部分更新 | 管理员 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/api/admin/settings",
        get(handler::get_settings).put(handler::update_settings),
    )
}
