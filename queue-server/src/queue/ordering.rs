//! 排序策略
//!
//! 每个 (service_type, location) 分区内严格按 `created_at` 先来先服务，
//! 相同时间按 id 升序。纯函数，每次查询重新计算：一次排序加一次线性扫描。

use shared::models::{Entry, EntryStatus, Partition, PublicEntry, RankedEntry};
use std::cmp::Ordering;
use std::collections::HashMap;

/// 两个 entry 的服务先后
pub fn fifo(a: &Entry, b: &Entry) -> Ordering {
    a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))
}

/// 为等待中的 entry 排名
///
/// 忽略非 waiting 状态。结果按全局 FIFO 顺序排列，`position` 在每个
/// 分区内从 1 开始。
pub fn rank<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Vec<RankedEntry> {
    let mut waiting: Vec<&Entry> = entries
        .into_iter()
        .filter(|e| e.status == EntryStatus::Waiting)
        .collect();
    waiting.sort_by(|a, b| fifo(a, b));

    let mut counters: HashMap<Partition, u32> = HashMap::new();
    waiting
        .into_iter()
        .map(|entry| {
            let position = counters.entry(entry.partition()).or_insert(0);
            *position += 1;
            RankedEntry {
                entry: PublicEntry::from(entry),
                position: *position,
            }
        })
        .collect()
}
