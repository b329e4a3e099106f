//! 排队引擎
//!
//! - [`storage`]: redb 持久化（entry、id 序列、历史、设置）
//! - [`ordering`]: 按 (service_type, location) 的 FIFO 排名
//! - [`estimator`]: 等待时间估算
//! - [`snapshot`]: 派生的队列视图
//! - [`analytics`]: 后台统计
//! - [`manager`]: 串联以上各部分的 entry store

pub mod analytics;
pub mod estimator;
pub mod manager;
pub mod ordering;
pub mod snapshot;
pub mod storage;

pub use estimator::{DEFAULT_HISTORY_WINDOW, ServiceHistory, WaitEstimator};
pub use manager::{CreatedEntry, ManagerResult, QueueError, QueueManager, QueueState};
pub use storage::{QueueStorage, StorageError, StorageStats};
