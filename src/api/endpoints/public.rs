//! Public profile endpoint.
//!
//! Unlike the admin routes this surface deliberately exposes only the
//! client's name and program names. Dates of birth, contact details and
//! medical metadata never leave the admin API.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::endpoints::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::models::PublicProfile;
use crate::services::clients;

/// `GET /public/clients/:id/profile` — reduced client view.
pub async fn profile(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PublicProfile>>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.open_db()?;
    let profile = clients::public_profile(&conn, &id)?;
    Ok(Json(ApiResponse::data(profile)))
}
