use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::error::{AppError, AppResult, ErrorCode, ErrorResponse};
use shared::message::{QueueEvent, Topic, UpdateReason};
use shared::util::now_millis;
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::api::extract::AppQuery;
use crate::auth::SessionStore;
use crate::core::ServerState;
use crate::live::Subscription;

const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Comma separated; empty = all topics
    #[serde(default)]
    topics: String,
    entry_id: Option<u64>,
    /// 管理员会话（浏览器 WebSocket 无法设置 Authorization 头）
    session: Option<String>,
}

/// Client → Server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// 请求一次全量快照
    Resync,
    /// 替换当前订阅
    Subscribe {
        #[serde(default)]
        topics: Vec<Topic>,
        entry_id: Option<u64>,
    },
}

/// GET /api/ws
pub async fn handle_ws(
    State(state): State<ServerState>,
    headers: HeaderMap,
    AppQuery(query): AppQuery<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let requested = if query.topics.trim().is_empty() {
        Vec::new()
    } else {
        Topic::parse_list(&query.topics).map_err(|e| AppError::invalid_field("topics", e))?
    };
    let is_admin = resolve_admin(&state, &headers, query.session.as_deref())?;
    let entry_id = query.entry_id;
    let topics = scope_topics(requested, entry_id, is_admin)?;
    Ok(ws.on_upgrade(move |socket| ws_session(socket, state, topics, entry_id, is_admin)))
}

/// 有会话令牌时校验，无令牌视为匿名
fn resolve_admin(state: &ServerState, headers: &HeaderMap, query_token: Option<&str>) -> AppResult<bool> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(SessionStore::extract_from_header)
        .or(query_token);
    match token {
        Some(token) => {
            state.auth.sessions().validate(token, now_millis())?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// 限定匿名订阅的范围
///
/// 空列表表示默认订阅。匿名连接只能接收指定 `entry_id` 的 status_update：
/// 显式请求全部 status_update 时拒绝，默认订阅时去掉该主题。
pub fn scope_topics(requested: Vec<Topic>, entry_id: Option<u64>, is_admin: bool) -> AppResult<Vec<Topic>> {
    let explicit = !requested.is_empty();
    let topics = if explicit { requested } else { Topic::ALL.to_vec() };
    if is_admin || entry_id.is_some() || !topics.contains(&Topic::StatusUpdate) {
        return Ok(topics);
    }
    if explicit {
        return Err(AppError::with_message(
            ErrorCode::NotAuthenticated,
            "status_update without entry_id requires an admin session",
        ));
    }
    Ok(topics.into_iter().filter(|t| *t != Topic::StatusUpdate).collect())
}

async fn ws_session(
    socket: WebSocket,
    state: ServerState,
    topics: Vec<Topic>,
    entry_id: Option<u64>,
    is_admin: bool,
) {
    let (mut sink, mut stream) = socket.split();

    // 先订阅再取快照，保证快照之后的事件不丢
    let mut sub = state.hub.subscribe_filtered(&topics, entry_id);
    tracing::info!(
        topics = ?topics,
        entry_id = ?entry_id,
        is_admin,
        subscribers = state.hub.subscriber_count(),
        "Live WS connected"
    );

    if send_snapshot(&mut sink, &state, &sub, UpdateReason::Resync).await.is_err() {
        return;
    }

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = sub.recv() => {
                match event {
                    Ok(event) => {
                        if send_message(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "Live subscriber lagged, resending full snapshot");
                        let filter = sub.filter().clone();
                        sub = state.hub.subscribe_with(filter);
                        if send_snapshot(&mut sink, &state, &sub, UpdateReason::Resync).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientCommand>(&text) {
                            Ok(ClientCommand::Resync) => {
                                if send_snapshot(&mut sink, &state, &sub, UpdateReason::Resync).await.is_err() {
                                    break;
                                }
                            }
                            Ok(ClientCommand::Subscribe { topics, entry_id }) => {
                                let topics = match scope_topics(topics, entry_id, is_admin) {
                                    Ok(topics) => topics,
                                    Err(e) => {
                                        // 保留原订阅
                                        tracing::debug!(error = %e, "Rejected live subscription change");
                                        if send_error(&mut sink, &e).await.is_err() {
                                            break;
                                        }
                                        continue;
                                    }
                                };
                                sub = state.hub.subscribe_filtered(&topics, entry_id);
                                tracing::debug!(topics = ?topics, entry_id = ?entry_id, "Live WS resubscribed");
                                if send_snapshot(&mut sink, &state, &sub, UpdateReason::Resync).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => tracing::debug!(error = %e, "Ignoring malformed client command"),
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(entry_id = ?entry_id, "Live WS disconnected");
}

/// 仅在订阅了 queue_update 时推送快照
async fn send_snapshot<S>(
    sink: &mut S,
    state: &ServerState,
    sub: &Subscription,
    reason: UpdateReason,
) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    if !sub.filter().wants(Topic::QueueUpdate) {
        return Ok(());
    }
    let event = QueueEvent::queue_update(reason, None, state.queue.snapshot_at(now_millis()));
    send_message(sink, &event).await
}

async fn send_error<S>(sink: &mut S, err: &AppError) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(&ErrorResponse::from(err)).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}

async fn send_message<S>(sink: &mut S, event: &QueueEvent) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(event).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_commands() {
        let cmd: ClientCommand = serde_json::from_str(r#"{"type":"resync"}"#).unwrap();
        assert!(matches!(cmd, ClientCommand::Resync));

        let cmd: ClientCommand =
            serde_json::from_str(r#"{"type":"subscribe","topics":["status_update"],"entry_id":7}"#)
                .unwrap();
        match cmd {
            ClientCommand::Subscribe { topics, entry_id } => {
                assert_eq!(topics, vec![Topic::StatusUpdate]);
                assert_eq!(entry_id, Some(7));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_anonymous_default_drops_status_updates() {
        let topics = scope_topics(vec![], None, false).unwrap();
        assert_eq!(topics, vec![Topic::QueueUpdate]);
    }

    #[test]
    fn test_anonymous_unscoped_status_updates_rejected() {
        let err = scope_topics(vec![Topic::StatusUpdate], None, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
        assert!(scope_topics(vec![Topic::QueueUpdate, Topic::StatusUpdate], None, false).is_err());
    }

    #[test]
    fn test_scoped_or_admin_subscriptions_pass() {
        assert_eq!(
            scope_topics(vec![Topic::StatusUpdate], Some(3), false).unwrap(),
            vec![Topic::StatusUpdate]
        );
        assert_eq!(scope_topics(vec![], Some(3), false).unwrap(), Topic::ALL.to_vec());
        assert_eq!(scope_topics(vec![], None, true).unwrap(), Topic::ALL.to_vec());
        assert_eq!(
            scope_topics(vec![Topic::QueueUpdate], None, false).unwrap(),
            vec![Topic::QueueUpdate]
        );
    }
}
