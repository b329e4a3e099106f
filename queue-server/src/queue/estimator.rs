//! 等待时间估算
//!
//! ```text
//! estimated_wait = ceil(position / max(capacity, 1)) * avg_service_minutes(service_type)
//! ```
//!
//! - position 0（正在服务）→ 0
//! - 无历史数据 → 服务目录默认值，再退回 [`FALLBACK_SERVICE_MINUTES`]
//! - 结果保留一位小数，设置了 `max_wait_time` 时再封顶
//!
//! 历史不变时估算值是 position 的非递减阶梯函数，向分区尾部追加
//! entry 不会改变前面任何人的估算。

use shared::models::{
    AdminSettings, Partition, Prediction, PublicEntry, RankedEntry, ServiceCatalog, ServiceRecord,
    ServiceType,
};
use shared::util::round_to;
use std::collections::{HashMap, VecDeque};

/// 历史和服务目录都没有该服务类型时使用
pub const FALLBACK_SERVICE_MINUTES: f64 = 30.0;

/// 每个服务类型默认保留的历史样本数
pub const DEFAULT_HISTORY_WINDOW: usize = 50;

/// 容量至少为 1
pub fn effective_capacity(raw: i64) -> i64 {
    raw.max(1)
}

/// 核心公式，结果恒为有限非负数
pub fn estimate_wait(position: u32, capacity: i64, avg_service_minutes: f64) -> f64 {
    if position == 0 {
        return 0.0;
    }
    let avg = if avg_service_minutes.is_finite() {
        avg_service_minutes.max(0.0)
    } else {
        0.0
    };
    let capacity = effective_capacity(capacity);
    let rounds = (i64::from(position) + capacity - 1) / capacity;
    round_to(rounds as f64 * avg, 1)
}

/// 按服务类型滚动保留的服务时长样本
#[derive(Debug, Clone)]
pub struct ServiceHistory {
    window: usize,
    samples: HashMap<ServiceType, VecDeque<f64>>,
}

impl ServiceHistory {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            samples: HashMap::new(),
        }
    }

    /// 由持久化记录重建（旧的在前）
    pub fn from_records(window: usize, records: &[ServiceRecord]) -> Self {
        let mut history = Self::new(window);
        for record in records {
            history.record(record);
        }
        history
    }

    pub fn record(&mut self, record: &ServiceRecord) {
        if !record.service_minutes.is_finite() || record.service_minutes < 0.0 {
            tracing::warn!(entry_id = record.entry_id, "Ignoring invalid service duration");
            return;
        }
        let samples = self.samples.entry(record.service_type).or_default();
        samples.push_back(record.service_minutes);
        while samples.len() > self.window {
            samples.pop_front();
        }
    }

    /// 窗口均值，无样本时为 `None`
    pub fn average(&self, service_type: ServiceType) -> Option<f64> {
        let samples = self.samples.get(&service_type)?;
        if samples.is_empty() {
            return None;
        }
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }

    pub fn sample_count(&self, service_type: ServiceType) -> usize {
        self.samples.get(&service_type).map_or(0, VecDeque::len)
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for ServiceHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

/// 基于服务目录、历史和设置只读视图的估算器
pub struct WaitEstimator<'a> {
    catalog: &'a ServiceCatalog,
    history: &'a ServiceHistory,
    cap: Option<f64>,
}

impl<'a> WaitEstimator<'a> {
    pub fn new(catalog: &'a ServiceCatalog, history: &'a ServiceHistory, settings: &AdminSettings) -> Self {
        Self {
            catalog,
            history,
            cap: settings.wait_cap(),
        }
    }

    /// 平均服务时长（分钟），无历史时退回默认值
    pub fn average_service_time(&self, service_type: ServiceType) -> f64 {
        if let Some(avg) = self.history.average(service_type) {
            return avg;
        }
        match self.catalog.default_service_time(service_type) {
            Some(default) => {
                tracing::debug!(service_type = %service_type, default, "No service history, using catalog default");
                default
            }
            None => {
                tracing::debug!(service_type = %service_type, "No service history or catalog default, using fallback");
                FALLBACK_SERVICE_MINUTES
            }
        }
    }

    pub fn capacity(&self, partition: &Partition) -> i64 {
        effective_capacity(self.catalog.capacity(partition))
    }

    pub fn estimate(&self, partition: &Partition, position: u32) -> f64 {
        let wait = estimate_wait(
            position,
            self.capacity(partition),
            self.average_service_time(partition.service_type),
        );
        match self.cap {
            Some(cap) => wait.min(cap),
            None => wait,
        }
    }

    /// 为所有正在服务（0）和等待中的 entry 生成预测
    pub fn predict(&self, ranked: &[RankedEntry], serving: &[PublicEntry]) -> Vec<Prediction> {
        let mut averages: HashMap<ServiceType, f64> = HashMap::new();
        let mut avg_for = |service_type: ServiceType| {
            *averages
                .entry(service_type)
                .or_insert_with(|| self.average_service_time(service_type))
        };

        let serving_predictions = serving.iter().map(|entry| Prediction {
            entry_id: entry.id,
            service_type: entry.service_type,
            location: entry.location.clone(),
            position: 0,
            estimated_wait: 0.0,
        });
        let mut predictions: Vec<Prediction> = serving_predictions.collect();

        for r in ranked {
            let partition = r.entry.partition();
            let mut wait = estimate_wait(r.position, self.capacity(&partition), avg_for(partition.service_type));
            if let Some(cap) = self.cap {
                wait = wait.min(cap);
            }
            predictions.push(Prediction {
                entry_id: r.entry.id,
                service_type: r.entry.service_type,
                location: r.entry.location.clone(),
                position: r.position,
                estimated_wait: wait,
            });
        }
        predictions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(service_type: ServiceType, minutes: f64) -> ServiceRecord {
        ServiceRecord {
            entry_id: 1,
            service_type,
            location: "Main Dining".to_string(),
            party_size: 2,
            service_minutes: minutes,
            total_minutes: minutes,
            created_at: 0,
            completed_at: 0,
        }
    }

    #[test]
    fn test_ceil_formula() {
        // avg 20, capacity 2, position 3 → ceil(3/2) * 20 = 40
        assert_eq!(estimate_wait(3, 2, 20.0), 40.0);
        assert_eq!(estimate_wait(2, 2, 20.0), 20.0);
        assert_eq!(estimate_wait(1, 2, 20.0), 20.0);
        assert_eq!(estimate_wait(0, 2, 20.0), 0.0);
    }

    #[test]
    fn test_capacity_clamp() {
        assert_eq!(effective_capacity(0), 1);
        assert_eq!(effective_capacity(-4), 1);
        assert_eq!(estimate_wait(3, 0, 10.0), 30.0);
        assert_eq!(estimate_wait(3, -1, 10.0), 30.0);
    }

    #[test]
    fn test_never_negative_or_infinite() {
        assert_eq!(estimate_wait(5, 1, -3.0), 0.0);
        assert_eq!(estimate_wait(5, 1, f64::NAN), 0.0);
        assert_eq!(estimate_wait(5, 1, f64::INFINITY), 0.0);
        assert_eq!(estimate_wait(u32::MAX, 1, 1.0), u32::MAX as f64);
    }

    #[test]
    fn test_monotonic_in_position() {
        let mut previous = 0.0;
        for position in 1..50 {
            let wait = estimate_wait(position, 3, 12.5);
            assert!(wait >= previous);
            previous = wait;
        }
    }

    #[test]
    fn test_history_rolling_window() {
        let mut history = ServiceHistory::new(2);
        history.record(&record(ServiceType::Takeout, 10.0));
        history.record(&record(ServiceType::Takeout, 20.0));
        history.record(&record(ServiceType::Takeout, 40.0));
        assert_eq!(history.sample_count(ServiceType::Takeout), 2);
        assert_eq!(history.average(ServiceType::Takeout), Some(30.0));
        assert_eq!(history.average(ServiceType::Delivery), None);
    }

    #[test]
    fn test_history_ignores_invalid_samples() {
        let mut history = ServiceHistory::new(5);
        history.record(&record(ServiceType::Takeout, f64::NAN));
        history.record(&record(ServiceType::Takeout, -1.0));
        assert_eq!(history.average(ServiceType::Takeout), None);
    }

    #[test]
    fn test_falls_back_to_catalog_default() {
        let catalog = ServiceCatalog::standard();
        let history = ServiceHistory::default();
        let settings = AdminSettings {
            max_wait_time: 0,
            ..Default::default()
        };
        let estimator = WaitEstimator::new(&catalog, &history, &settings);
        assert_eq!(estimator.average_service_time(ServiceType::DineIn), 45.0);

        // Private Room has one slot: position 2 → 2 rounds
        let partition = Partition::new(ServiceType::DineIn, "Private Room");
        assert_eq!(estimator.estimate(&partition, 2), 90.0);
    }

    #[test]
    fn test_falls_back_without_catalog_entry() {
        let catalog = ServiceCatalog { services: vec![] };
        let history = ServiceHistory::default();
        let estimator = WaitEstimator::new(&catalog, &history, &AdminSettings::default());
        assert_eq!(
            estimator.average_service_time(ServiceType::Delivery),
            FALLBACK_SERVICE_MINUTES
        );
        // unknown partition → capacity 1
        let partition = Partition::new(ServiceType::Delivery, "Nowhere");
        assert_eq!(estimator.capacity(&partition), 1);
    }

    #[test]
    fn test_estimates_are_capped() {
        let catalog = ServiceCatalog::standard();
        let history = ServiceHistory::default();
        let settings = AdminSettings {
            max_wait_time: 60,
            ..Default::default()
        };
        let estimator = WaitEstimator::new(&catalog, &history, &settings);
        let partition = Partition::new(ServiceType::DineIn, "Private Room");
        assert_eq!(estimator.estimate(&partition, 5), 60.0);
    }
}
