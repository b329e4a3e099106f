//! Live event types
//!
//! Shared between queue-server and its clients, carried over the
//! in-process broadcast channel and the WebSocket. Pushes are an
//! optimization: a client that missed events pulls
//! `GET /api/queue/status` to catch up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{Entry, EntryStatus, PublicEntry, QueueSnapshot};

/// Subscription topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Queue composition changed (create, status change, delete, tick)
    QueueUpdate,
    /// One entry changed status
    StatusUpdate,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::QueueUpdate, Topic::StatusUpdate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::QueueUpdate => "queue_update",
            Topic::StatusUpdate => "status_update",
        }
    }

    /// Parse a comma separated topic list; empty input means every topic
    pub fn parse_list(raw: &str) -> Result<Vec<Topic>, String> {
        let topics = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Topic::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if topics.is_empty() {
            Ok(Topic::ALL.to_vec())
        } else {
            Ok(topics)
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queue_update" => Ok(Topic::QueueUpdate),
            "status_update" => Ok(Topic::StatusUpdate),
            other => Err(format!("unknown topic: {}", other)),
        }
    }
}

/// Why a queue_update was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateReason {
    Created,
    StatusChanged,
    NotesUpdated,
    Deleted,
    Cleanup,
    SettingsChanged,
    /// Periodic push
    Tick,
    /// Full snapshot resent to a lagging or new subscriber
    Resync,
}

/// queue_update payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueUpdate {
    pub reason: UpdateReason,
    /// Entry that triggered the update, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<u64>,
    pub snapshot: QueueSnapshot,
}

/// status_update payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub entry_id: u64,
    pub old_status: EntryStatus,
    pub new_status: EntryStatus,
    pub entry: PublicEntry,
}

/// Event body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    QueueUpdate(QueueUpdate),
    StatusUpdate(StatusUpdate),
}

/// Broadcast event
///
/// ```json
/// { "event_id": "…", "timestamp": 1700000000000, "type": "queue_update", "data": { … } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEvent {
    pub event_id: Uuid,
    pub timestamp: i64,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl QueueEvent {
    fn new(payload: EventPayload) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: crate::util::now_millis(),
            payload,
        }
    }

    pub fn queue_update(reason: UpdateReason, entry_id: Option<u64>, snapshot: QueueSnapshot) -> Self {
        Self::new(EventPayload::QueueUpdate(QueueUpdate {
            reason,
            entry_id,
            snapshot,
        }))
    }

    pub fn status_update(old_status: EntryStatus, entry: &Entry) -> Self {
        Self::new(EventPayload::StatusUpdate(StatusUpdate {
            entry_id: entry.id,
            old_status,
            new_status: entry.status,
            entry: PublicEntry::from(entry),
        }))
    }

    pub fn topic(&self) -> Topic {
        match self.payload {
            EventPayload::QueueUpdate(_) => Topic::QueueUpdate,
            EventPayload::StatusUpdate(_) => Topic::StatusUpdate,
        }
    }

    /// Entry the event is about (None for tick / resync / cleanup updates)
    pub fn entry_id(&self) -> Option<u64> {
        match &self.payload {
            EventPayload::QueueUpdate(u) => u.entry_id,
            EventPayload::StatusUpdate(u) => Some(u.entry_id),
        }
    }
}
