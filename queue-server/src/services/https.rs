use crate::auth::require_admin;
use crate::core::ServerState;
use axum::{Router, middleware};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        // Public APIs
        .merge(crate::api::health::router())
        .merge(crate::api::services::router())
        .merge(crate::api::reservations::router())
        .merge(crate::api::queue::router())
        .merge(crate::api::ws::router())
        // Admin APIs
        .merge(crate::api::admin::router())
        .merge(crate::api::settings::router())
        .merge(crate::api::analytics::router())
}

/// Full router bound to state, with auth and tower layers
pub fn build_router(state: ServerState) -> Router {
    build_app()
        // 会话认证中间件 - require_admin 内部会跳过公共路由
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
        // Tower HTTP 中间件
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // HTTP 请求日志中间件
        .layer(middleware::from_fn(log_request))
}

#[derive(Clone, Debug)]
pub struct HttpService {
    state: ServerState,
}

impl HttpService {
    pub fn new(state: ServerState) -> Self {
        Self { state }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve until `shutdown_signal` resolves
    pub async fn start_server<F>(&self, shutdown_signal: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("🚀 Starting HTTP server on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal)
            .await
    }
}
