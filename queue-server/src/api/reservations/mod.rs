//! Reservation API 模块 (公共路由)
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/reservations | POST | 取号 |
//! | /api/reservations/{id} | GET | 查询排队进度 |

mod handler;

pub use handler::ReservationRequest;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reservations", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/{id}", get(handler::get_by_id))
}
