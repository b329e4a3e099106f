//! Reservation API Handlers

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use shared::client::{ReservationCreated, ReservationDetail};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{EntryDraft, ServiceType};
use validator::Validate;

use crate::api::extract::{AppJson, AppPath, validation_error};
use crate::core::ServerState;

/// `POST /api/reservations` body
///
/// `service_type` is parsed by hand so an unknown value maps to
/// `UnknownServiceType` instead of a generic JSON error.
#[derive(Debug, Deserialize, Validate)]
pub struct ReservationRequest {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 32, message = "phone must be at most 32 characters"))]
    pub phone: Option<String>,
    #[validate(email(message = "email is not a valid address"))]
    pub email: Option<String>,
    #[validate(range(min = 1, max = 20, message = "party_size must be between 1 and 20"))]
    pub party_size: i64,
    pub service_type: String,
    pub location: Option<String>,
}

impl ReservationRequest {
    /// 表单里的空字符串视为未填写
    fn normalized(self) -> Self {
        fn blank_to_none(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }
        Self {
            name: self.name.trim().to_string(),
            phone: blank_to_none(self.phone),
            email: blank_to_none(self.email),
            location: blank_to_none(self.location),
            ..self
        }
    }

    fn into_draft(self) -> AppResult<EntryDraft> {
        let service_type: ServiceType = self.service_type.parse().map_err(|_| {
            AppError::with_message(
                ErrorCode::UnknownServiceType,
                format!("Unknown service type: {}", self.service_type),
            )
            .with_detail("field", "service_type")
        })?;
        let party_size = u32::try_from(self.party_size).map_err(|_| {
            AppError::invalid_field("party_size", "party_size must be between 1 and 20")
        })?;
        Ok(EntryDraft {
            name: self.name,
            phone: self.phone,
            email: self.email,
            party_size,
            service_type,
            location: self.location,
        })
    }
}

/// 取号
pub async fn create(
    State(state): State<ServerState>,
    AppJson(payload): AppJson<ReservationRequest>,
) -> AppResult<(StatusCode, Json<ReservationCreated>)> {
    let request = payload.normalized();
    request.validate().map_err(validation_error)?;
    let created = state.queue.create(request.into_draft()?)?;
    Ok((
        StatusCode::CREATED,
        Json(ReservationCreated {
            id: created.entry.id,
            queue_position: created.position,
            estimated_wait: created.estimated_wait,
            entry: created.entry,
        }),
    ))
}

/// 查询排队进度
pub async fn get_by_id(
    State(state): State<ServerState>,
    AppPath(id): AppPath<u64>,
) -> AppResult<Json<ReservationDetail>> {
    Ok(Json(state.queue.reservation_detail(id)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(service_type: &str, party_size: i64) -> ReservationRequest {
        ReservationRequest {
            name: " Ana ".to_string(),
            phone: Some(String::new()),
            email: Some("".to_string()),
            party_size,
            service_type: service_type.to_string(),
            location: None,
        }
    }

    #[test]
    fn test_blank_optionals_are_dropped() {
        let req = request("dine-in", 2).normalized();
        assert_eq!(req.name, "Ana");
        assert!(req.phone.is_none());
        assert!(req.email.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_invalid_email() {
        let mut req = request("dine-in", 2);
        req.email = Some("not-an-email".to_string());
        let err = validation_error(req.normalized().validate().unwrap_err());
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.details.unwrap().get("field").unwrap(), "email");
    }

    #[test]
    fn test_party_size_range() {
        assert!(request("dine-in", 0).validate().is_err());
        assert!(request("dine-in", 21).validate().is_err());
        assert!(request("dine-in", 20).normalized().validate().is_ok());
    }

    #[test]
    fn test_unknown_service_type() {
        let err = request("buffet", 2).into_draft().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownServiceType);
    }
}
