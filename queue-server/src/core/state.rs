use std::sync::Arc;
use std::time::Instant;

use shared::models::ServiceCatalog;

use crate::auth::AdminAuth;
use crate::core::{Config, Result};
use crate::live::LiveStatusHub;
use crate::queue::QueueManager;

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | queue | Arc<QueueManager> | 排队记录存储与快照 |
/// | hub | LiveStatusHub | 实时事件分发 |
/// | auth | Arc<AdminAuth> | 管理员口令与会话 |
/// | started_at | Instant | 启动时间 (健康检查) |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    pub queue: Arc<QueueManager>,
    pub hub: LiveStatusHub,
    pub auth: Arc<AdminAuth>,
    pub started_at: Instant,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 通常使用 [`initialize()`](Self::initialize) 方法代替
    pub fn new(config: Config, queue: Arc<QueueManager>, auth: Arc<AdminAuth>) -> Self {
        Self {
            config,
            hub: queue.hub().clone(),
            queue,
            auth,
            started_at: Instant::now(),
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录
    /// 2. 实时事件中心
    /// 3. 排队存储 (work_dir/queue.redb)
    /// 4. 管理员认证 (哈希口令)
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir()?;

        let hub = LiveStatusHub::new(config.event_channel_capacity);
        let queue = QueueManager::new(
            config.database_path(),
            ServiceCatalog::standard(),
            hub,
            config.history_window,
        )?;
        let auth = AdminAuth::from_config(config)?;

        Ok(Self::new(config.clone(), Arc::new(queue), Arc::new(auth)))
    }

    /// 运行时长 (秒)
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// 打印启动信息 (日志)
    pub fn print_startup_banner_content(&self) {
        let snapshot = self.queue.snapshot();
        tracing::info!(
            "╔══════════════════════════════════════════════════════════════════════╗"
        );
        tracing::info!(
            "║                     RESTAURANT QUEUE SERVER                          ║"
        );
        tracing::info!(
            "╚══════════════════════════════════════════════════════════════════════╝"
        );
        tracing::info!("  Environment  : {}", self.config.environment);
        tracing::info!("  Database     : {}", self.config.database_path().display());
        tracing::info!("  Waiting      : {}", snapshot.total_waiting);
        tracing::info!("  Serving      : {}", snapshot.serving_count());
        tracing::info!("  HTTP Server  : http://localhost:{}", self.config.http_port);
        tracing::info!("  Live Channel : ws://localhost:{}/api/ws", self.config.http_port);
        tracing::info!(
            "════════════════════════════════════════════════════════════════════════"
        );
    }
}
