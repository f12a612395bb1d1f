use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::mentorship::chat::ChatError;
use crate::mentorship::lifecycle::AcceptError;
use crate::training::progression::ProgressionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The caller asked for a transition the current state does not allow.
    /// The code is a stable machine-readable tag, e.g. `NO_ACTIVE_TASK`.
    #[error("Invalid state ({0}): {1}")]
    InvalidState(&'static str, String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ProgressionError> for AppError {
    fn from(err: ProgressionError) -> Self {
        let code = match &err {
            ProgressionError::TaskAlreadyActive { .. } => "TASK_ALREADY_ACTIVE",
            ProgressionError::NoActiveTask => "NO_ACTIVE_TASK",
            ProgressionError::PhaseComplete => "PHASE_COMPLETE",
        };
        AppError::InvalidState(code, err.to_string())
    }
}

impl From<AcceptError> for AppError {
    fn from(err: AcceptError) -> Self {
        match err {
            AcceptError::RequestNotFound(_) | AcceptError::GuideNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            AcceptError::RequestNotOpen(_) => {
                AppError::InvalidState("REQUEST_NOT_OPEN", err.to_string())
            }
            AcceptError::Storage(e) => AppError::Internal(e),
        }
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::SessionNotFound(_) => AppError::NotFound(err.to_string()),
            ChatError::NotParticipant { .. } => AppError::Forbidden(err.to_string()),
            ChatError::Storage(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::InvalidState(code, msg) => (StatusCode::CONFLICT, *code, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_no_active_task_maps_to_conflict() {
        let response = AppError::from(ProgressionError::NoActiveTask).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_request_not_open_keeps_its_code() {
        let err = AppError::from(AcceptError::RequestNotOpen(Uuid::nil()));
        assert!(matches!(err, AppError::InvalidState("REQUEST_NOT_OPEN", _)));
    }

    #[test]
    fn test_missing_guide_maps_to_not_found() {
        let response = AppError::from(AcceptError::GuideNotFound(Uuid::nil())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response = AppError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_non_participant_maps_to_forbidden() {
        let err = ChatError::NotParticipant {
            session_id: Uuid::nil(),
            user_id: Uuid::nil(),
        };
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
