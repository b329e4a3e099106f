use std::path::PathBuf;

/// 服务器配置 - 排队服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 格式日志 |
/// | LOG_DIR | (无) | 日志目录，存在时按天滚动写文件 |
/// | ADMIN_PASSWORD | (开发环境 admin123) | 管理员口令 |
/// | SESSION_TTL_MINUTES | 480 | 会话空闲过期时间 |
/// | HISTORY_WINDOW | 50 | 估算使用的最近完成记录数 |
/// | EVENT_CHANNEL_CAPACITY | 256 | 实时事件缓冲 |
/// | CLEANUP_CHECK_SECS | 60 | 清理任务检查间隔 |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 关闭超时 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/queue HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// 管理员口令 (启动时哈希)
    pub admin_password: Option<String>,
    pub session_ttl_minutes: i64,
    /// 每种服务类型保留的完成记录样本数
    pub history_window: usize,
    pub event_channel_capacity: usize,
    pub cleanup_check_secs: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            log_dir: std::env::var("LOG_DIR").ok(),
            admin_password: std::env::var("ADMIN_PASSWORD").ok(),
            session_ttl_minutes: env_or("SESSION_TTL_MINUTES", 480),
            history_window: env_or("HISTORY_WINDOW", crate::queue::DEFAULT_HISTORY_WINDOW),
            event_channel_capacity: env_or(
                "EVENT_CHANNEL_CAPACITY",
                crate::live::DEFAULT_CHANNEL_CAPACITY,
            ),
            cleanup_check_secs: env_or("CLEANUP_CHECK_SECS", 60),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库文件: work_dir/queue.redb
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("queue.redb")
    }

    /// 确保工作目录存在
    pub fn ensure_work_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = Config::with_overrides("/tmp/queue-test", 9999);
        assert_eq!(config.work_dir, "/tmp/queue-test");
        assert_eq!(config.http_port, 9999);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/queue-test/queue.redb")
        );
    }
}
