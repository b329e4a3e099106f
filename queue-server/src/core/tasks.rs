//! 后台任务管理
//!
//! 统一管理所有后台任务的注册、启动和关闭。
//!
//! # 已注册任务
//!
//! 全部为定时任务：
//!
//! | 名称 | 说明 |
//! |------|------|
//! | cleanup_sweeper | 按 TTL 删除已完成/已取消记录 |
//! | broadcast_tick | 按 notification_interval 推送快照 |
//! | session_sweeper | 清理过期会话 |

use futures::FutureExt;
use shared::message::UpdateReason;
use shared::util::now_millis;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::ServerState;

/// notification_interval 为 0 时重新检查设置的间隔
const TICK_IDLE_RECHECK: Duration = Duration::from_secs(30);

/// 会话清理间隔
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// 已注册的后台任务
struct RegisteredTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// 后台任务管理器
///
/// ```ignore
/// let mut tasks = BackgroundTasks::new();
/// tasks.spawn("cleanup_sweeper", async move {
///     // 任务逻辑
/// });
///
/// // Graceful shutdown
/// tasks.shutdown().await;
/// ```
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    /// 全局取消令牌
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// 获取取消令牌（用于任务内部监听 shutdown 信号）
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 注册并启动一个后台任务
    ///
    /// 任务会被包装以捕获 panic；取消前退出会记录告警。
    pub fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let token = self.shutdown.clone();
        let wrapped_future = async move {
            let result: Result<(), Box<dyn std::any::Any + Send>> =
                AssertUnwindSafe(future).catch_unwind().await;
            match result {
                Ok(()) if token.is_cancelled() => {}
                Ok(()) => {
                    tracing::warn!(task = %name, "Background task completed unexpectedly");
                }
                Err(panic_info) => {
                    let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        (*s).to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    tracing::error!(
                        task = %name,
                        panic = %panic_msg,
                        "Background task panicked! This is a bug that should be reported."
                    );
                }
            }
        };

        let handle = tokio::spawn(wrapped_future);
        tracing::debug!(task = %name, "Registered background task");
        self.tasks.push(RegisteredTask { name, handle });
    }

    /// 打印任务摘要
    pub fn log_summary(&self) {
        let names: Vec<&str> = self.tasks.iter().map(|t| t.name).collect();
        tracing::info!(
            tasks = ?names,
            "Background tasks registered: {} total",
            self.tasks.len()
        );
    }

    /// Graceful shutdown - 取消所有任务并等待完成
    pub async fn shutdown(self, timeout: Duration) {
        tracing::info!("Shutting down {} background tasks...", self.tasks.len());
        self.shutdown.cancel();

        for task in self.tasks {
            match tokio::time::timeout(timeout, task.handle).await {
                Ok(Ok(())) => tracing::debug!(task = %task.name, "Task completed"),
                Ok(Err(e)) if e.is_cancelled() => tracing::debug!(task = %task.name, "Task cancelled"),
                Ok(Err(e)) => tracing::error!(task = %task.name, error = ?e, "Task panicked"),
                Err(_) => tracing::warn!(task = %task.name, "Task did not stop before timeout"),
            }
        }

        tracing::info!("All background tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

/// 注册排队服务的全部后台任务
pub fn spawn_queue_tasks(state: &ServerState) -> BackgroundTasks {
    let mut tasks = BackgroundTasks::new();

    let token = tasks.shutdown_token();
    let s = state.clone();
    let every = Duration::from_secs(state.config.cleanup_check_secs.max(1));
    tasks.spawn("cleanup_sweeper", async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
            }
            if let Err(e) = s.queue.cleanup_resolved(now_millis()) {
                tracing::error!(error = %e, "Cleanup sweep failed");
            }
        }
    });

    let token = tasks.shutdown_token();
    let s = state.clone();
    tasks.spawn("broadcast_tick", async move {
        loop {
            // 每轮重新读取，设置修改无需重启
            let secs = s.queue.settings().notification_interval;
            let wait = if secs == 0 {
                TICK_IDLE_RECHECK
            } else {
                Duration::from_secs(secs)
            };
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
            if s.queue.settings().notification_interval > 0 && s.hub.subscriber_count() > 0 {
                s.queue.publish_snapshot(UpdateReason::Tick);
            }
        }
    });

    let token = tasks.shutdown_token();
    let s = state.clone();
    tasks.spawn("session_sweeper", async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
            }
            let removed = s.auth.sessions().sweep(now_millis());
            if removed > 0 {
                tracing::debug!(removed, "Expired admin sessions swept");
            }
        }
    });

    tasks.log_summary();
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(tasks: &BackgroundTasks) -> usize {
        tasks.tasks.iter().filter(|t| t.handle.is_finished()).count()
    }

    #[tokio::test]
    async fn test_shutdown_cancels_tasks() {
        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();
        tasks.spawn("waiter", async move {
            token.cancelled().await;
        });
        assert_eq!(tasks.tasks.len(), 1);
        assert_eq!(finished(&tasks), 0);
        tasks.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_panicking_task_is_contained() {
        let mut tasks = BackgroundTasks::new();
        tasks.spawn("boom", async {
            panic!("boom");
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(finished(&tasks), 1);
        tasks.shutdown(Duration::from_secs(1)).await;
    }
}
