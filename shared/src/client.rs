//! Client-related types shared between server and client
//!
//! Request/response bodies of the REST API that are not domain models.

use serde::{Deserialize, Serialize};

use crate::models::{Entry, PublicEntry, ServiceRecord};

// =============================================================================
// Reservation API DTOs
// =============================================================================

/// `POST /api/reservations` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreated {
    pub id: u64,
    /// 1-based position inside the entry's partition
    pub queue_position: u32,
    /// Minutes
    pub estimated_wait: f64,
    pub entry: Entry,
}

/// `GET /api/reservations/{id}` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationDetail {
    pub entry: PublicEntry,
    /// Only set while waiting
    pub queue_position: Option<u32>,
    /// 0 while serving, None once resolved
    pub estimated_wait: Option<f64>,
}

// =============================================================================
// Admin API DTOs
// =============================================================================

/// Admin login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Admin login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Opaque token, sent back as `Authorization: Bearer <session_id>`
    pub session_id: String,
    /// Unix millis; sliding, refreshed by every authenticated call
    pub expires_at: i64,
}

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `GET /api/admin/export` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportBundle {
    pub exported_at: i64,
    pub entries: Vec<Entry>,
    pub service_history: Vec<ServiceRecord>,
}

// =============================================================================
// Health
// =============================================================================

/// `GET /api/health` response
///
/// `status` is `"degraded"` when the store cannot be read; `storage` is then absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub total_waiting: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageHealth>,
}

/// Row counts of the entry store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageHealth {
    pub entry_count: u64,
    pub history_count: u64,
    pub last_entry_id: u64,
}
