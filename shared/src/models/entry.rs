//! Queue Entry Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::service::ServiceType;

/// Entry lifecycle status
///
/// ```text
/// waiting ──▶ serving ──▶ completed
///    │           │
///    └───────────┴──────▶ cancelled
/// ```
///
/// `seated` is accepted as an input alias of `serving`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Waiting,
    #[serde(alias = "seated")]
    Serving,
    Cancelled,
    Completed,
}

impl EntryStatus {
    pub const ALL: [EntryStatus; 4] = [
        EntryStatus::Waiting,
        EntryStatus::Serving,
        EntryStatus::Cancelled,
        EntryStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Waiting => "waiting",
            EntryStatus::Serving => "serving",
            EntryStatus::Cancelled => "cancelled",
            EntryStatus::Completed => "completed",
        }
    }

    /// Forward-only lifecycle check
    pub fn can_transition_to(&self, next: EntryStatus) -> bool {
        matches!(
            (self, next),
            (EntryStatus::Waiting, EntryStatus::Serving)
                | (EntryStatus::Waiting, EntryStatus::Cancelled)
                | (EntryStatus::Serving, EntryStatus::Completed)
                | (EntryStatus::Serving, EntryStatus::Cancelled)
        )
    }

    /// Still occupying the queue or a service slot
    pub fn is_active(&self) -> bool {
        matches!(self, EntryStatus::Waiting | EntryStatus::Serving)
    }

    pub fn is_resolved(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(EntryStatus::Waiting),
            "serving" | "seated" => Ok(EntryStatus::Serving),
            "cancelled" => Ok(EntryStatus::Cancelled),
            "completed" => Ok(EntryStatus::Completed),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// Ranking partition: entries are ordered within (service_type, location)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Partition {
    pub service_type: ServiceType,
    pub location: String,
}

impl Partition {
    pub fn new(service_type: ServiceType, location: impl Into<String>) -> Self {
        Self {
            service_type,
            location: location.into(),
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service_type, self.location)
    }
}

/// Queue entry - one customer's reservation ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Monotonic id assigned by the store
    pub id: u64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub party_size: u32,
    pub service_type: ServiceType,
    pub location: String,
    pub status: EntryStatus,
    /// Admin notes
    pub notes: Option<String>,
    /// Creation time (Unix millis), immutable
    pub created_at: i64,
    pub updated_at: Option<i64>,
    /// Time the entry started being served (Unix millis)
    pub serving_at: Option<i64>,
    /// Time the entry left waiting/serving for good (Unix millis)
    pub resolved_at: Option<i64>,
}

impl Entry {
    pub fn partition(&self) -> Partition {
        Partition::new(self.service_type, self.location.clone())
    }

    pub fn in_partition(&self, partition: &Partition) -> bool {
        self.service_type == partition.service_type && self.location == partition.location
    }

    /// Minutes between creation and completion, only for completed entries
    pub fn total_wait_minutes(&self) -> Option<f64> {
        if self.status != EntryStatus::Completed {
            return None;
        }
        self.resolved_at
            .map(|resolved| crate::util::minutes_between(self.created_at, resolved))
    }
}

/// Entry as shown to anonymous clients
///
/// Drops contact details and admin notes; served by the public snapshot,
/// reservation lookup and live events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicEntry {
    pub id: u64,
    pub name: String,
    pub party_size: u32,
    pub service_type: ServiceType,
    pub location: String,
    pub status: EntryStatus,
    pub created_at: i64,
    pub serving_at: Option<i64>,
    pub resolved_at: Option<i64>,
}

impl PublicEntry {
    pub fn partition(&self) -> Partition {
        Partition::new(self.service_type, self.location.clone())
    }

    pub fn in_partition(&self, partition: &Partition) -> bool {
        self.service_type == partition.service_type && self.location == partition.location
    }
}

impl From<&Entry> for PublicEntry {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            party_size: entry.party_size,
            service_type: entry.service_type,
            location: entry.location.clone(),
            status: entry.status,
            created_at: entry.created_at,
            serving_at: entry.serving_at,
            resolved_at: entry.resolved_at,
        }
    }
}

/// Validated input for a new entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDraft {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub party_size: u32,
    pub service_type: ServiceType,
    /// Defaults to the first location of the service type
    pub location: Option<String>,
}

/// Admin status update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryStatusUpdate {
    pub status: EntryStatus,
    pub notes: Option<String>,
}

/// List filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryFilter {
    pub status: Option<EntryStatus>,
    pub service_type: Option<ServiceType>,
    pub location: Option<String>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &Entry) -> bool {
        self.status.is_none_or(|s| entry.status == s)
            && self.service_type.is_none_or(|t| entry.service_type == t)
            && self
                .location
                .as_deref()
                .is_none_or(|l| entry.location == l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only_transitions() {
        use EntryStatus::*;
        assert!(Waiting.can_transition_to(Serving));
        assert!(Waiting.can_transition_to(Cancelled));
        assert!(Serving.can_transition_to(Completed));
        assert!(Serving.can_transition_to(Cancelled));

        assert!(!Serving.can_transition_to(Waiting));
        assert!(!Cancelled.can_transition_to(Waiting));
        assert!(!Completed.can_transition_to(Waiting));
        assert!(!Waiting.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
        for s in EntryStatus::ALL {
            assert!(!s.can_transition_to(s));
        }
    }

    #[test]
    fn test_seated_alias() {
        let status: EntryStatus = serde_json::from_str("\"seated\"").unwrap();
        assert_eq!(status, EntryStatus::Serving);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"serving\"");
        assert_eq!("seated".parse::<EntryStatus>().unwrap(), EntryStatus::Serving);
    }

    #[test]
    fn test_filter_matches() {
        let entry = Entry {
            id: 1,
            name: "Ana".to_string(),
            phone: None,
            email: None,
            party_size: 2,
            service_type: ServiceType::DineIn,
            location: "Outdoor".to_string(),
            status: EntryStatus::Waiting,
            notes: None,
            created_at: 0,
            updated_at: None,
            serving_at: None,
            resolved_at: None,
        };

        assert!(EntryFilter::default().matches(&entry));
        let filter = EntryFilter {
            status: Some(EntryStatus::Waiting),
            location: Some("Outdoor".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&entry));
        let filter = EntryFilter {
            service_type: Some(ServiceType::Takeout),
            ..Default::default()
        };
        assert!(!filter.matches(&entry));
    }

    #[test]
    fn test_public_entry_hides_contact_details() {
        let entry = Entry {
            id: 3,
            name: "Ana".to_string(),
            phone: Some("555-1234".to_string()),
            email: Some("ana@example.com".to_string()),
            party_size: 4,
            service_type: ServiceType::DineIn,
            location: "Main Dining".to_string(),
            status: EntryStatus::Waiting,
            notes: Some("window seat".to_string()),
            created_at: 10,
            updated_at: Some(11),
            serving_at: None,
            resolved_at: None,
        };

        let public = PublicEntry::from(&entry);
        assert_eq!(public.partition(), entry.partition());
        let json = serde_json::to_value(&public).unwrap();
        assert_eq!(json["name"], "Ana");
        assert_eq!(json["party_size"], 4);
        for hidden in ["phone", "email", "notes", "updated_at"] {
            assert!(json.get(hidden).is_none(), "{} leaked", hidden);
        }
    }
}
