//! Queue API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/queue/status | GET | 队列快照 (轮询兜底) | 无 |
//! | /api/queue | GET | 全部记录 (可按状态/服务/区域过滤) | 管理员 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/queue", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/status", get(handler::status))
}
