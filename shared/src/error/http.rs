//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::EntryNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::InvalidTransition | Self::QueueFull => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::InvalidCredentials | Self::SessionExpired => {
                StatusCode::UNAUTHORIZED
            }

            // 500 Internal Server Error
            Self::InternalError | Self::StorageError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (validation errors)
            Self::ValidationFailed
            | Self::UnknownServiceType
            | Self::LocationNotAllowed
            | Self::PartySizeExceeded => StatusCode::BAD_REQUEST,
        }
    }
}
