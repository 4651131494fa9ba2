//! Client endpoints.
//!
//! CRUD for client records plus a case-insensitive search via the
//! `?search=` query parameter on the list route.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiResponse};
use crate::models::{ClientDetail, ClientWithMetadata};
use crate::services::clients::{self, ClientDraft};

#[derive(Deserialize)]
pub struct ClientListQuery {
    pub search: Option<String>,
}

/// `GET /clients` — list clients, optionally filtered by search text.
pub async fn index(
    State(ctx): State<ApiContext>,
    Query(query): Query<ClientListQuery>,
) -> Result<Json<ApiResponse<Vec<ClientWithMetadata>>>, ApiError> {
    let conn = ctx.open_db()?;
    let found = clients::list_clients(&conn, query.search.as_deref())?;
    Ok(Json(ApiResponse::data(found)))
}

/// `POST /clients` — register a new client.
pub async fn store(
    State(ctx): State<ApiContext>,
    ApiJson(draft): ApiJson<ClientDraft>,
) -> Result<(StatusCode, Json<ApiResponse<ClientWithMetadata>>), ApiError> {
    let conn = ctx.open_db()?;
    let created = clients::create_client(&conn, &draft)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(created))))
}

/// `GET /clients/:id` — one client with metadata and enrolled programs.
pub async fn show(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ClientDetail>>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.open_db()?;
    let detail = clients::get_client(&conn, &id)?;
    Ok(Json(ApiResponse::data(detail)))
}

/// `PUT /clients/:id` and `PATCH /clients/:id` — partial update.
///
/// Both verbs merge the provided fields into the stored record, so a
/// PUT with a subset of fields behaves like a PATCH.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(draft): ApiJson<ClientDraft>,
) -> Result<Json<ApiResponse<ClientWithMetadata>>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.open_db()?;
    let updated = clients::update_client(&conn, &id, &draft)?;
    Ok(Json(ApiResponse::data(updated)))
}

/// `DELETE /clients/:id` — remove a client and all dependent rows.
pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.open_db()?;
    clients::delete_client(&conn, &id)?;
    Ok(Json(ApiResponse::message("Client deleted successfully")))
}
