//! Enrollment endpoint.
//!
//! One route: `POST /enrollments` attaches a client to one or more
//! programs and refreshes the stored enrollment count for each program
//! named in the request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiResponse};
use crate::services::enrollment::{self, EnrollmentDraft, EnrollmentReport};

/// `POST /enrollments` — enroll a client into programs.
///
/// Pairs that already exist are skipped and reported separately, so
/// re-posting the same request is safe.
pub async fn store(
    State(ctx): State<ApiContext>,
    ApiJson(draft): ApiJson<EnrollmentDraft>,
) -> Result<(StatusCode, Json<ApiResponse<EnrollmentReport>>), ApiError> {
    let conn = ctx.open_db()?;
    let report = enrollment::enroll(&conn, &draft)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(report))))
}
