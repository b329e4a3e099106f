//! WebSocket endpoint — 队列实时推送
//!
//! GET /api/ws?topics=queue_update,status_update&entry_id=<id>
//!
//! 协议:
//! - Server → Client: [`QueueEvent`] (`queue_update` / `status_update`)
//! - Client → Server: [`ClientCommand`] (`resync`, `subscribe`)
//!
//! 连接建立后先推送一次全量快照；订阅者落后时丢弃积压事件，
//! 改为推送最新快照。

mod handler;

pub use handler::ClientCommand;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/ws", get(handler::handle_ws))
}
