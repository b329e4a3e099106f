//! 后台统计
//!
//! 每次请求都从当前 entry 集合计算，硬删除的记录立即从统计中消失。
//! 日期和小时均按 UTC。

use chrono::Duration;
use shared::models::{
    AnalyticsSummary, DAILY_STATS_DAYS, DEFAULT_PEAK_HOURS, DailyStat, DistributionItem, Entry,
    HourlyWait, QueueSnapshot, ServiceCatalog, ServiceType, format_minutes, format_percent,
};
use shared::util::{date_of, hour_of, round_to};
use std::collections::BTreeMap;

/// `GET /api/analytics`
pub fn summarize<'a>(
    entries: impl IntoIterator<Item = &'a Entry> + Clone,
    snapshot: &QueueSnapshot,
    catalog: &ServiceCatalog,
    now: i64,
) -> AnalyticsSummary {
    let total_reservations = entries.clone().into_iter().count();

    // 取号最多的小时，并列时取较早的
    let mut per_hour = [0usize; 24];
    for entry in entries.clone() {
        per_hour[hour_of(entry.created_at) as usize] += 1;
    }
    let mut busiest: Vec<(u32, usize)> = per_hour
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(hour, count)| (hour as u32, *count))
        .collect();
    busiest.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let peak_hours = if busiest.is_empty() {
        DEFAULT_PEAK_HOURS.iter().map(|h| h.to_string()).collect()
    } else {
        busiest
            .iter()
            .take(2)
            .map(|(hour, _)| format!("{:02}:00", hour))
            .collect()
    };

    // 最近 N 天，旧的在前
    let today = date_of(now);
    let mut per_day: BTreeMap<chrono::NaiveDate, usize> = BTreeMap::new();
    for entry in entries.clone() {
        *per_day.entry(date_of(entry.created_at)).or_default() += 1;
    }
    let daily_stats = (0..DAILY_STATS_DAYS)
        .rev()
        .map(|days_ago| {
            let date = today - Duration::days(days_ago);
            DailyStat {
                date: date.format("%Y-%m-%d").to_string(),
                count: per_day.get(&date).copied().unwrap_or(0),
            }
        })
        .collect();

    let mut per_type: BTreeMap<ServiceType, usize> = BTreeMap::new();
    for entry in entries {
        *per_type.entry(entry.service_type).or_default() += 1;
    }
    let service_type_distribution = per_type
        .into_iter()
        .map(|(service_type, value)| DistributionItem {
            name: service_type.to_string(),
            value,
        })
        .collect();

    let total_capacity = catalog.total_capacity().max(1);
    AnalyticsSummary {
        total_reservations,
        average_wait_time: format_minutes(snapshot.estimated_wait_time),
        peak_hours,
        current_capacity: format_percent(snapshot.serving_count() as f64 / total_capacity as f64),
        daily_stats,
        service_type_distribution,
    }
}

/// `GET /api/analytics/wait-times`：按取号小时统计已完成记录的等待时长
pub fn hourly_waits<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Vec<HourlyWait> {
    let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); 24];
    for entry in entries {
        if let Some(minutes) = entry.total_wait_minutes() {
            buckets[hour_of(entry.created_at) as usize].push(minutes);
        }
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(hour, waits)| {
            let (average_wait, max_wait) = if waits.is_empty() {
                (0.0, 0.0)
            } else {
                let sum: f64 = waits.iter().sum();
                let max = waits.iter().copied().fold(0.0, f64::max);
                (sum / waits.len() as f64, max)
            };
            HourlyWait {
                hour: hour as u32,
                average_wait: round_to(average_wait, 2),
                max_wait: round_to(max_wait, 2),
            }
        })
        .collect()
}
