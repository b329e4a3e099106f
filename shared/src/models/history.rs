//! Service History Model
//!
//! One record per completed entry. History is kept apart from the entries
//! table so hard-deleting an entry never changes the estimator's inputs.

use serde::{Deserialize, Serialize};

use super::entry::Entry;
use super::service::ServiceType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub entry_id: u64,
    pub service_type: ServiceType,
    pub location: String,
    pub party_size: u32,
    /// Minutes from serving to completion
    pub service_minutes: f64,
    /// Minutes from creation to completion
    pub total_minutes: f64,
    pub created_at: i64,
    pub completed_at: i64,
}

impl ServiceRecord {
    /// Build a record from a completed entry; `None` for any other status
    pub fn from_completed(entry: &Entry) -> Option<Self> {
        let completed_at = entry.resolved_at?;
        let total_minutes = entry.total_wait_minutes()?;
        let started = entry.serving_at.unwrap_or(entry.created_at);
        Some(Self {
            entry_id: entry.id,
            service_type: entry.service_type,
            location: entry.location.clone(),
            party_size: entry.party_size,
            service_minutes: crate::util::minutes_between(started, completed_at),
            total_minutes,
            created_at: entry.created_at,
            completed_at,
        })
    }
}
