//! Logging Infrastructure
//!
//! - 控制台: 开发环境 pretty，生产环境 JSON
//! - `log_dir` 存在时额外写文件:
//!   - `app/` 应用日志 (按天滚动，保留 14 天)
//!   - `security/` 安全日志 (target = "security"，按天滚动，不自动删除)

use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// 应用日志保留天数
const APP_LOG_RETENTION_DAYS: usize = 14;

/// Initialize the logger (console only)
pub fn init_logger(level: &str) -> anyhow::Result<()> {
    init_logger_with_file(level, false, None)
}

/// Initialize the logging system with daily rotating logs
///
/// # Arguments
/// * `level` - Log level (e.g., "info", "debug"); `RUST_LOG` takes precedence
/// * `json_format` - JSON console output (production)
/// * `log_dir` - Optional directory for file logging
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let (app_layer, security_layer) = match log_dir {
        Some(dir) => {
            let log_dir = Path::new(dir);
            let app_log_dir = log_dir.join("app");
            let security_log_dir = log_dir.join("security");
            fs::create_dir_all(&app_log_dir)?;
            fs::create_dir_all(&security_log_dir)?;

            let app_log = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("queue-server")
                .filename_suffix("log")
                .max_log_files(APP_LOG_RETENTION_DAYS)
                .build(app_log_dir)?;
            let app_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_writer(std::sync::Mutex::new(app_log))
                .with_filter(filter_fn(|meta| meta.target() != "security"));

            let security_log = RollingFileAppender::new(Rotation::DAILY, security_log_dir, "security");
            let security_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::sync::Mutex::new(security_log))
                .with_filter(filter_fn(|meta| meta.target() == "security"));

            (Some(app_layer), Some(security_layer))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(app_layer)
        .with(security_layer)
        .try_init()?;

    Ok(())
}
