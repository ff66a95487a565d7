use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::{
        capacity::Denial,
        lifecycle::{ApplyError, PlanError},
    },
};

/// Failures of the roster engine, independent of the transport.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The store answered with an error or could not be reached.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// No store is installed right now.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Admission denied: no roster slot or pool seat left, or the team has the wrong size.
    #[error("{0}")]
    CapacityExhausted(String),
    /// Duplicate registration, taken handle, or a phone owned by another participant.
    #[error("{0}")]
    Conflict(String),
    /// The caller may not act on this resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Malformed or out-of-range input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The session, registration, or invite is not in a state that allows the call.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A lifecycle transition ran past its deadline and was rolled back.
    #[error("operation timed out")]
    Timeout,
    /// Unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { message } => ServiceError::Conflict(message),
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<Denial> for ServiceError {
    fn from(denial: Denial) -> Self {
        ServiceError::CapacityExhausted(denial.to_string())
    }
}

impl From<PlanError> for ServiceError {
    fn from(err: PlanError) -> Self {
        let message = match err {
            PlanError::AlreadyPending => "session transition already pending".to_string(),
            PlanError::InvalidTransition(invalid) => invalid.to_string(),
        };
        ServiceError::InvalidState(message)
    }
}

impl From<ApplyError> for ServiceError {
    fn from(err: ApplyError) -> Self {
        let message = match err {
            ApplyError::NoPending => "no transition is pending".to_string(),
            ApplyError::IdMismatch { .. } => "pending transition does not match".to_string(),
            ApplyError::StatusMismatch { expected, actual } => format!(
                "session status changed during transition (expected {expected:?}, got {actual:?})"
            ),
        };
        ServiceError::InvalidState(message)
    }
}

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// 400.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// 401.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// 404.
    #[error("not found: {0}")]
    NotFound(String),
    /// Capacity denials and state conflicts.
    #[error("conflict: {0}")]
    Conflict(String),
    /// 503, including degraded mode.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// 500.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Timeout => AppError::ServiceUnavailable("operation timed out".into()),
            ServiceError::CapacityExhausted(message)
            | ServiceError::Conflict(message)
            | ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Internal(message) => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = Json(ErrorBody {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_denial_maps_to_conflict() {
        let app: AppError = ServiceError::from(Denial::SessionFull).into();
        assert!(matches!(app, AppError::Conflict(ref m) if m == "session full"));
        assert_eq!(app.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_conflict_is_not_reported_as_outage() {
        let err: ServiceError = StorageError::conflict("phone already in use").into();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn transition_timeout_is_unavailable() {
        let app: AppError = ServiceError::Timeout.into();
        assert_eq!(app.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
