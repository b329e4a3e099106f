//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::time::Duration;

use crate::core::tasks::spawn_queue_tasks;
use crate::core::{Config, Result, ServerState};
use crate::services::HttpService;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config)?,
        };

        let tasks = spawn_queue_tasks(&state);
        state.print_startup_banner_content();

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        let served = HttpService::new(state.clone()).start_server(shutdown).await;

        tasks
            .shutdown(Duration::from_millis(self.config.shutdown_timeout_ms))
            .await;

        served?;
        Ok(())
    }
}
