use super::super::storage::StorageError;
use shared::error::{AppError, ErrorCode};
use shared::models::{EntryStatus, ServiceType};
use thiserror::Error;

/// QueueManager 错误
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Queue entry {0} not found")]
    EntryNotFound(u64),

    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: EntryStatus, to: EntryStatus },

    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("Service type {0} is not offered")]
    UnknownServiceType(ServiceType),

    #[error("Location '{location}' is not available for {service_type}")]
    LocationNotAllowed {
        service_type: ServiceType,
        location: String,
    },

    #[error("Party size {party_size} exceeds the maximum of {max} for {service_type}")]
    PartySizeExceeded {
        service_type: ServiceType,
        party_size: u32,
        max: u32,
    },

    #[error("Queue is full ({0} waiting)")]
    QueueFull(u32),

    #[error(transparent)]
    InvalidSettings(AppError),
}

impl QueueError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        QueueError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<redb::TransactionError> for QueueError {
    fn from(err: redb::TransactionError) -> Self {
        QueueError::Storage(err.into())
    }
}

impl From<redb::CommitError> for QueueError {
    fn from(err: redb::CommitError) -> Self {
        QueueError::Storage(err.into())
    }
}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Storage(e) => {
                tracing::error!(error = %e, "Queue storage error");
                AppError::storage(e.to_string())
            }
            QueueError::EntryNotFound(id) => AppError::entry_not_found(id),
            QueueError::InvalidTransition { from, to } => {
                AppError::invalid_transition(from.as_str(), to.as_str())
            }
            QueueError::Validation { field, message } => AppError::invalid_field(field, message),
            e @ QueueError::UnknownServiceType(_) => {
                AppError::with_message(ErrorCode::UnknownServiceType, e.to_string())
                    .with_detail("field", "service_type")
            }
            e @ QueueError::LocationNotAllowed { .. } => {
                AppError::with_message(ErrorCode::LocationNotAllowed, e.to_string())
                    .with_detail("field", "location")
            }
            e @ QueueError::PartySizeExceeded { max, .. } => {
                AppError::with_message(ErrorCode::PartySizeExceeded, e.to_string())
                    .with_detail("field", "party_size")
                    .with_detail("max", max)
            }
            e @ QueueError::QueueFull(_) => AppError::with_message(ErrorCode::QueueFull, e.to_string()),
            QueueError::InvalidSettings(e) => e,
        }
    }
}

pub type ManagerResult<T> = Result<T, QueueError>;
