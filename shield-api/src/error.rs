use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shield_board::{ClaimError, TrackerError};
use shield_core::repository::RepoError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    UnprocessableError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UnprocessableError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        Self::InternalServerError(err.to_string())
    }
}

impl From<ClaimError> for AppError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::ShiftNotFound(_) => Self::NotFoundError(err.to_string()),
            ClaimError::Invalid(e) => Self::ValidationError(e.to_string()),
            ClaimError::Repository(e) => Self::InternalServerError(e.to_string()),
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::PermissionDenied | TrackerError::NotAssigned(_) => {
                Self::AuthorizationError(err.to_string())
            }
            TrackerError::Location(_) | TrackerError::Invalid(_) => Self::ValidationError(err.to_string()),
            TrackerError::ShiftNotFound(_) => Self::NotFoundError(err.to_string()),
            TrackerError::AlreadyCheckedIn(_)
            | TrackerError::NotCheckedIn(_)
            | TrackerError::AlreadyCheckedOut(_) => Self::ConflictError(err.to_string()),
            TrackerError::Repository(e) => Self::InternalServerError(e.to_string()),
        }
    }
}
