//! Program endpoints.
//!
//! CRUD for health programs. The `current_enrollment` counter shown in
//! program metadata is read as stored; only the enrollment endpoint
//! refreshes it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::endpoints::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiResponse};
use crate::models::{ProgramDetail, ProgramWithMetadata};
use crate::services::programs::{self, ProgramDraft};

/// `GET /programs` — list programs with metadata.
pub async fn index(
    State(ctx): State<ApiContext>,
) -> Result<Json<ApiResponse<Vec<ProgramWithMetadata>>>, ApiError> {
    let conn = ctx.open_db()?;
    let found = programs::list_programs(&conn)?;
    Ok(Json(ApiResponse::data(found)))
}

/// `POST /programs` — create a new program.
pub async fn store(
    State(ctx): State<ApiContext>,
    ApiJson(draft): ApiJson<ProgramDraft>,
) -> Result<(StatusCode, Json<ApiResponse<ProgramWithMetadata>>), ApiError> {
    let conn = ctx.open_db()?;
    let created = programs::create_program(&conn, &draft)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(created))))
}

/// `GET /programs/:id` — one program with metadata and enrolled clients.
pub async fn show(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProgramDetail>>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.open_db()?;
    let detail = programs::get_program(&conn, &id)?;
    Ok(Json(ApiResponse::data(detail)))
}

/// `PUT /programs/:id` and `PATCH /programs/:id` — partial update.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(draft): ApiJson<ProgramDraft>,
) -> Result<Json<ApiResponse<ProgramWithMetadata>>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.open_db()?;
    let updated = programs::update_program(&conn, &id, &draft)?;
    Ok(Json(ApiResponse::data(updated)))
}

/// `DELETE /programs/:id` — remove a program and its enrollments.
pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.open_db()?;
    programs::delete_program(&conn, &id)?;
    Ok(Json(ApiResponse::message("Program deleted successfully")))
}
