use thiserror::Error;

use crate::queue::QueueError;

/// 启动与运行期错误 (请求级错误使用 `AppError`)
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("队列存储初始化失败: {0}")]
    Queue(#[from] QueueError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

impl From<shared::error::AppError> for ServerError {
    fn from(err: shared::error::AppError) -> Self {
        ServerError::Config(err.message)
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
