//! Shared state and the response envelope for the HTTP layer.

use std::path::PathBuf;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use rusqlite::Connection;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::db;

// ═══════════════════════════════════════════════════════════
// API context — shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes: the location of the store.
///
/// Handlers open a fresh connection per request and every read goes
/// back to SQLite; no entity state is held in process.
#[derive(Clone)]
pub struct ApiContext {
    db_path: Arc<PathBuf>,
}

impl ApiContext {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path: Arc::new(db_path),
        }
    }

    /// Open a connection to the configured database.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        db::open_database(&self.db_path).map_err(|e| ApiError::Internal(e.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════
// Response envelope
// ═══════════════════════════════════════════════════════════

/// Success envelope: `{"success": true, "data": ..., "message": ...}`
/// with absent parts omitted. Failures use the same shape via
/// [`ApiError`](crate::api::error::ApiError).
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    /// Message-only success, no data key.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Request body extraction
// ═══════════════════════════════════════════════════════════

/// `axum::Json` with its rejection rewritten into [`ApiError`].
///
/// A body the extractor cannot deserialize (wrong field type, malformed
/// JSON, missing JSON content type) would otherwise answer with axum's
/// plain-text rejection and bypass the response envelope.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}
