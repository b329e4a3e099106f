//! Admin Settings Model

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Upper bound for `max_wait_time` (minutes)
pub const MAX_WAIT_TIME_LIMIT: u32 = 24 * 60;

/// Upper bound for `notification_interval` (seconds)
pub const NOTIFICATION_INTERVAL_LIMIT: u64 = 3600;

/// Opening hours, `HH:MM`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    pub start: String,
    pub end: String,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "22:00".to_string(),
        }
    }
}

/// Process-wide queue settings, changed only by an admin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSettings {
    /// Cap applied to every wait estimate (minutes, 0 = uncapped)
    pub max_wait_time: u32,
    /// Periodic queue_update broadcast (seconds, 0 = disabled)
    pub notification_interval: u64,
    /// Sweep resolved entries after `cleanup_after_minutes`
    pub auto_cleanup: bool,
    /// Maximum waiting entries (0 = unlimited)
    pub max_queue_size: u32,
    pub cleanup_after_minutes: u32,
    pub operating_hours: OperatingHours,
    pub updated_at: i64,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            max_wait_time: 120,
            notification_interval: 30,
            auto_cleanup: true,
            max_queue_size: 50,
            cleanup_after_minutes: 60,
            operating_hours: OperatingHours::default(),
            updated_at: 0,
        }
    }
}

/// Partial settings update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminSettingsUpdate {
    pub max_wait_time: Option<u32>,
    pub notification_interval: Option<u64>,
    pub auto_cleanup: Option<bool>,
    pub max_queue_size: Option<u32>,
    pub cleanup_after_minutes: Option<u32>,
    pub operating_hours: Option<OperatingHours>,
}

impl AdminSettings {
    /// Apply a partial update; leaves `self` untouched on error
    pub fn apply(&mut self, update: AdminSettingsUpdate, now: i64) -> AppResult<()> {
        if let Some(v) = update.max_wait_time
            && v > MAX_WAIT_TIME_LIMIT
        {
            return Err(AppError::invalid_field(
                "max_wait_time",
                format!("max_wait_time must be at most {} minutes", MAX_WAIT_TIME_LIMIT),
            ));
        }
        if let Some(v) = update.notification_interval
            && v > NOTIFICATION_INTERVAL_LIMIT
        {
            return Err(AppError::invalid_field(
                "notification_interval",
                format!(
                    "notification_interval must be at most {} seconds",
                    NOTIFICATION_INTERVAL_LIMIT
                ),
            ));
        }
        if let Some(hours) = &update.operating_hours {
            validate_hours(hours)?;
        }

        if let Some(v) = update.max_wait_time {
            self.max_wait_time = v;
        }
        if let Some(v) = update.notification_interval {
            self.notification_interval = v;
        }
        if let Some(v) = update.auto_cleanup {
            self.auto_cleanup = v;
        }
        if let Some(v) = update.max_queue_size {
            self.max_queue_size = v;
        }
        if let Some(v) = update.cleanup_after_minutes {
            self.cleanup_after_minutes = v;
        }
        if let Some(v) = update.operating_hours {
            self.operating_hours = v;
        }
        self.updated_at = now;
        Ok(())
    }

    /// `None` when estimates are uncapped
    pub fn wait_cap(&self) -> Option<f64> {
        (self.max_wait_time > 0).then_some(self.max_wait_time as f64)
    }
}

fn validate_hours(hours: &OperatingHours) -> AppResult<()> {
    let parse = |value: &str| {
        NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
            AppError::invalid_field(
                "operating_hours",
                format!("Invalid time '{}', expected HH:MM", value),
            )
        })
    };
    let start = parse(&hours.start)?;
    let end = parse(&hours.end)?;
    if start >= end {
        return Err(AppError::invalid_field(
            "operating_hours",
            "operating_hours.start must be before operating_hours.end",
        ));
    }
    Ok(())
}
