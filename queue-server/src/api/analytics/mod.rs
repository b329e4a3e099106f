//! Analytics API 模块 (管理员)
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/analytics | GET | 汇总统计 |
//! | /api/analytics/wait-times | GET | 按小时的等待时长 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/analytics", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::summary))
        .route("/wait-times", get(handler::wait_times))
}
