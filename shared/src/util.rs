/// Current UTC timestamp (Unix millis)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Minutes elapsed between two millisecond timestamps, never negative
pub fn minutes_between(from_millis: i64, to_millis: i64) -> f64 {
    (to_millis - from_millis).max(0) as f64 / 60_000.0
}

/// Round to `decimals` places (half away from zero)
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Hour of day (0-23, UTC) of a millisecond timestamp
pub fn hour_of(millis: i64) -> u32 {
    use chrono::Timelike;
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.hour())
        .unwrap_or(0)
}

/// Calendar date (UTC) of a millisecond timestamp
pub fn date_of(millis: i64) -> chrono::NaiveDate {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.date_naive())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_between() {
        assert_eq!(minutes_between(0, 90_000), 1.5);
        assert_eq!(minutes_between(90_000, 0), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.345, 2), 12.35);
        assert_eq!(round_to(7.04, 1), 7.0);
    }

    #[test]
    fn test_hour_and_date() {
        // 2024-03-05 14:30:00 UTC
        let ts = 1_709_649_000_000;
        assert_eq!(hour_of(ts), 14);
        assert_eq!(date_of(ts).to_string(), "2024-03-05");
    }
}
