//! Queue Snapshot Model
//!
//! Derived view of the entry store, recomputed after every mutation.
//! Never persisted.

use serde::{Deserialize, Serialize};

use super::entry::{Partition, PublicEntry};
use super::service::ServiceType;

/// Waiting entry with its 1-based position inside its partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    #[serde(flatten)]
    pub entry: PublicEntry,
    pub position: u32,
}

/// Estimated wait of a single entry (minutes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub entry_id: u64,
    pub service_type: ServiceType,
    pub location: String,
    /// 0 while being served
    pub position: u32,
    pub estimated_wait: f64,
}

/// Per-partition counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub service_type: ServiceType,
    pub location: String,
    pub waiting: usize,
    pub serving: usize,
    /// Effective (clamped) capacity
    pub capacity: i64,
    /// Average service duration used for estimates (minutes)
    pub average_service_time: f64,
}

impl PartitionSummary {
    pub fn partition(&self) -> Partition {
        Partition::new(self.service_type, self.location.clone())
    }
}

/// Point-in-time queue state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Entries being served
    pub current: Vec<PublicEntry>,
    /// Waiting entries, oldest first across all partitions
    pub next: Vec<RankedEntry>,
    pub partitions: Vec<PartitionSummary>,
    pub predictions: Vec<Prediction>,
    /// Mean of all waiting-entry estimates (minutes)
    pub estimated_wait_time: f64,
    pub total_waiting: usize,
    /// Unix millis the snapshot was built or last pushed
    pub last_updated: i64,
}

impl QueueSnapshot {
    pub fn prediction_for(&self, entry_id: u64) -> Option<&Prediction> {
        self.predictions.iter().find(|p| p.entry_id == entry_id)
    }

    pub fn position_of(&self, entry_id: u64) -> Option<u32> {
        self.next
            .iter()
            .find(|r| r.entry.id == entry_id)
            .map(|r| r.position)
    }

    pub fn serving_count(&self) -> usize {
        self.current.len()
    }
}
