//! Unified error codes for the queue service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 4xxx: Queue errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so that the dashboard and
/// the customer page can switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials
    InvalidCredentials = 1002,
    /// Session has expired
    SessionExpired = 1005,

    // ==================== 4xxx: Queue ====================
    /// Queue entry not found
    EntryNotFound = 4001,
    /// Status change violates the entry lifecycle
    InvalidTransition = 4002,
    /// Waiting queue reached the configured maximum size
    QueueFull = 4003,
    /// Unknown service type
    UnknownServiceType = 4101,
    /// Location is not served by the service type
    LocationNotAllowed = 4102,
    /// Party size exceeds the service type limit
    PartySizeExceeded = 4103,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Storage error
    StorageError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",

            // Auth
            ErrorCode::NotAuthenticated => "Admin session required",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::SessionExpired => "Session has expired",

            // Queue
            ErrorCode::EntryNotFound => "Queue entry not found",
            ErrorCode::InvalidTransition => "Status transition is not allowed",
            ErrorCode::QueueFull => "Queue is full",
            ErrorCode::UnknownServiceType => "Unknown service type",
            ErrorCode::LocationNotAllowed => "Location is not available for this service type",
            ErrorCode::PartySizeExceeded => "Party size exceeds the limit for this service type",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StorageError => "Storage error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1005 => Ok(ErrorCode::SessionExpired),

            // Queue
            4001 => Ok(ErrorCode::EntryNotFound),
            4002 => Ok(ErrorCode::InvalidTransition),
            4003 => Ok(ErrorCode::QueueFull),
            4101 => Ok(ErrorCode::UnknownServiceType),
            4102 => Ok(ErrorCode::LocationNotAllowed),
            4103 => Ok(ErrorCode::PartySizeExceeded),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StorageError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
