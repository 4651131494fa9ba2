//! API error taxonomy with HTTP status mapping.
//!
//! Every failure leaves through the same envelope the success path
//! uses: `{"success": false, "message": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;
use crate::services::ServiceError;

#[derive(Debug, Serialize)]
struct FailureBody {
    success: bool,
    message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A request field failed validation; the message is caller-facing.
    #[error("{0}")]
    Validation(String),
    /// The resource does not exist. Message stays generic so unknown
    /// and malformed ids are indistinguishable.
    #[error("Resource not found")]
    NotFound,
    /// The store rejected the request via a constraint.
    #[error("Constraint conflict: {0}")]
    Conflict(String),
    /// A multi-step operation stopped partway; the message says where.
    #[error("{0}")]
    Failed(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail.clone()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            ApiError::Conflict(detail) => {
                tracing::warn!(detail, "constraint conflict");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "The request conflicts with a data constraint".to_string(),
                )
            }
            ApiError::Failed(detail) => (StatusCode::INTERNAL_SERVER_ERROR, detail.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = FailureBody {
            success: false,
            message,
        };
        (status, Json(body)).into_response()
    }
}

fn is_constraint(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { .. } => ApiError::NotFound,
            DatabaseError::ConstraintViolation(detail) => ApiError::Conflict(detail),
            DatabaseError::Sqlite(e) if is_constraint(&e) => ApiError::Conflict(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => ApiError::Validation(e.to_string()),
            ServiceError::RecountFailed { .. } => ApiError::Failed(err.to_string()),
            ServiceError::Database(e) => e.into(),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        if is_constraint(&err) {
            ApiError::Conflict(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;
    use axum::body::to_bytes;
    use uuid::Uuid;

    #[tokio::test]
    async fn validation_returns_422_with_message() {
        let response = ApiError::Validation("first_name is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "first_name is required");
    }

    #[tokio::test]
    async fn not_found_returns_404_generic_message() {
        let response = ApiError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Resource not found");
    }

    #[tokio::test]
    async fn conflict_returns_422_without_sql_detail() {
        let response =
            ApiError::Conflict("CHECK constraint failed: program_metadata".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let message = json["message"].as_str().unwrap();
        assert!(!message.contains("CHECK"));
    }

    #[tokio::test]
    async fn internal_returns_500_and_hides_details() {
        let response = ApiError::Internal("something broke".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn failed_returns_500_with_message() {
        let pid = Uuid::new_v4();
        let err: ApiError = ServiceError::RecountFailed {
            program_id: pid,
            source: DatabaseError::ConstraintViolation("busy".into()),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let message = json["message"].as_str().unwrap();
        assert!(message.contains(&pid.to_string()));
    }

    #[tokio::test]
    async fn database_not_found_maps_to_404() {
        let err: ApiError = DatabaseError::not_found("Client", Uuid::new_v4()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn service_validation_maps_to_422() {
        let err: ApiError = ServiceError::Validation(ValidationError::new("gender is required")).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
