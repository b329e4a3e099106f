//! Queue Server - 餐厅排队服务
//!
//! # 架构概述
//!
//! - **排队引擎** (`queue`): 记录存储 (redb)、FIFO 排序、等待时间估算、统计
//! - **实时推送** (`live`): `queue_update` / `status_update` 事件分发
//! - **认证** (`auth`): Argon2 口令 + 随机会话令牌
//! - **HTTP API** (`api`): REST 接口与 WebSocket
//!
//! # 模块结构
//!
//! ```text
//! queue-server/src/
//! ├── core/          # 配置、状态、后台任务、错误
//! ├── auth/          # 管理员口令、会话、中间件
//! ├── queue/         # 排队引擎
//! ├── live/          # 实时事件中心
//! ├── services/      # Router 组装与 HTTP 服务
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod live;
pub mod queue;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{AdminAuth, AdminSession};
pub use core::{Config, Server, ServerState};
pub use live::LiveStatusHub;
pub use queue::{QueueError, QueueManager};
pub use services::{build_app, build_router};

// Re-export unified error types from shared
pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境: 加载 .env，按配置初始化日志
pub fn setup_environment() -> anyhow::Result<Config> {
    // .env 文件可选
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    init_logger_with_file(
        &config.log_level,
        config.log_json,
        config.log_dir.as_deref(),
    )?;
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
  ____
 / __ \__  _____  __  _____
/ / / / / / / _ \/ / / / _ \
/ /_/ / /_/ /  __/ /_/ /  __/
\___\_\__,_/\___/\__,_/\___/
    "#
    );
}
