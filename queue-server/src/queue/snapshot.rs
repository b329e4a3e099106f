//! 快照计算
//!
//! 由已提交的 entry 集合纯函数式地推导 [`QueueSnapshot`]：排名、预测、
//! 分区计数和整体平均等待时间。

use shared::models::{
    AdminSettings, Entry, EntryStatus, Partition, PartitionSummary, PublicEntry, QueueSnapshot,
    ServiceCatalog,
};
use shared::util::round_to;

use super::estimator::{ServiceHistory, WaitEstimator};
use super::ordering;

/// 由已提交的 entry 集合构建快照
pub fn build_snapshot<'a>(
    entries: impl IntoIterator<Item = &'a Entry> + Clone,
    catalog: &ServiceCatalog,
    history: &ServiceHistory,
    settings: &AdminSettings,
    last_updated: i64,
) -> QueueSnapshot {
    let estimator = WaitEstimator::new(catalog, history, settings);

    let next = ordering::rank(entries.clone());
    let mut serving: Vec<&Entry> = entries
        .into_iter()
        .filter(|e| e.status == EntryStatus::Serving)
        .collect();
    serving.sort_by(|a, b| {
        a.serving_at
            .cmp(&b.serving_at)
            .then_with(|| ordering::fifo(a, b))
    });
    let current: Vec<PublicEntry> = serving.into_iter().map(PublicEntry::from).collect();

    let predictions = estimator.predict(&next, &current);
    let waiting_estimates: Vec<f64> = predictions
        .iter()
        .filter(|p| p.position > 0)
        .map(|p| p.estimated_wait)
        .collect();
    let estimated_wait_time = if waiting_estimates.is_empty() {
        0.0
    } else {
        round_to(
            waiting_estimates.iter().sum::<f64>() / waiting_estimates.len() as f64,
            1,
        )
    };

    // 目录内分区在前，只出现在数据里的分区追加在后
    let mut partitions: Vec<PartitionSummary> = catalog
        .partitions()
        .into_iter()
        .map(|partition| empty_summary(&estimator, partition))
        .collect();
    for ranked in &next {
        let idx = summary_index(&mut partitions, &estimator, ranked.entry.partition());
        partitions[idx].waiting += 1;
    }
    for entry in &current {
        let idx = summary_index(&mut partitions, &estimator, entry.partition());
        partitions[idx].serving += 1;
    }

    QueueSnapshot {
        total_waiting: next.len(),
        current,
        next,
        partitions,
        predictions,
        estimated_wait_time,
        last_updated,
    }
}

fn empty_summary(estimator: &WaitEstimator<'_>, partition: Partition) -> PartitionSummary {
    PartitionSummary {
        capacity: estimator.capacity(&partition),
        average_service_time: round_to(estimator.average_service_time(partition.service_type), 1),
        service_type: partition.service_type,
        location: partition.location,
        waiting: 0,
        serving: 0,
    }
}

/// 分区在 `partitions` 中的下标，不存在时追加一条空计数
fn summary_index(
    partitions: &mut Vec<PartitionSummary>,
    estimator: &WaitEstimator<'_>,
    partition: Partition,
) -> usize {
    if let Some(idx) = partitions
        .iter()
        .position(|s| s.service_type == partition.service_type && s.location == partition.location)
    {
        return idx;
    }
    partitions.push(empty_summary(estimator, partition));
    partitions.len() - 1
}
