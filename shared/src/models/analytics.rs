//! Analytics DTOs consumed by the admin dashboard

use serde::{Deserialize, Serialize};

/// Default peak hours when no entry exists yet
pub const DEFAULT_PEAK_HOURS: [&str; 2] = ["12:00", "18:00"];

/// Number of days covered by `daily_stats`
pub const DAILY_STATS_DAYS: i64 = 7;

/// Entries created on one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: usize,
}

/// Chart slice: `{name, value}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionItem {
    pub name: String,
    pub value: usize,
}

/// Dashboard summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_reservations: usize,
    /// e.g. `"23 min"`
    pub average_wait_time: String,
    /// Two busiest creation hours, `"HH:00"`
    pub peak_hours: Vec<String>,
    /// e.g. `"40%"`
    pub current_capacity: String,
    /// Oldest first
    pub daily_stats: Vec<DailyStat>,
    pub service_type_distribution: Vec<DistributionItem>,
}

/// Completed-entry wait per creation hour (minutes, 2 decimals)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyWait {
    pub hour: u32,
    pub average_wait: f64,
    pub max_wait: f64,
}

/// Format a minute value the way the dashboard shows it
pub fn format_minutes(minutes: f64) -> String {
    format!("{} min", minutes.max(0.0).round() as i64)
}

/// Format a ratio (0.0-1.0+) as an integer percentage
pub fn format_percent(ratio: f64) -> String {
    format!("{}%", (ratio.max(0.0) * 100.0).floor() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_uses_camel_case() {
        let summary = AnalyticsSummary {
            total_reservations: 3,
            average_wait_time: format_minutes(22.6),
            peak_hours: DEFAULT_PEAK_HOURS.iter().map(|h| h.to_string()).collect(),
            current_capacity: format_percent(0.4),
            daily_stats: vec![],
            service_type_distribution: vec![DistributionItem {
                name: "dine-in".to_string(),
                value: 3,
            }],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["totalReservations"], 3);
        assert_eq!(json["averageWaitTime"], "23 min");
        assert_eq!(json["currentCapacity"], "40%");
        assert_eq!(json["peakHours"][1], "18:00");
        assert_eq!(json["serviceTypeDistribution"][0]["name"], "dine-in");
    }

    #[test]
    fn test_format_percent_truncates() {
        assert_eq!(format_percent(0.0), "0%");
        assert_eq!(format_percent(2.0 / 15.0), "13%");
        assert_eq!(format_percent(1.0), "100%");
    }
}
