//! Admin API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/admin/login | POST | 口令登录，签发会话 | 无 |
//! | /api/admin/logout | POST | 注销当前会话 | 管理员 |
//! | /api/admin/queue/{id} | PUT | 修改状态/备注 | 管理员 |
//! | /api/admin/queue/{id} | DELETE | 硬删除 (204) | 管理员 |
//! | /api/admin/export | GET | 导出全部记录与服务历史 | 管理员 |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/login", post(handler::login))
        .route("/logout", post(handler::logout))
        .route(
            "/queue/{id}",
            put(handler::update_entry).delete(handler::delete_entry),
        )
        .route("/export", get(handler::export))
}
