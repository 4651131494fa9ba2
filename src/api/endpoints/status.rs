//! Service status endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::db::sqlite;

#[derive(Serialize)]
pub struct StatusData {
    pub service: &'static str,
    pub version: &'static str,
}

/// `GET /status` — liveness check.
pub async fn status() -> Json<ApiResponse<StatusData>> {
    let data = StatusData {
        service: crate::config::APP_NAME,
        version: crate::config::APP_VERSION,
    };
    Json(ApiResponse::with_message(
        data,
        "✅ Careboard API is up and running",
    ))
}

#[derive(Serialize)]
pub struct DbTestData {
    pub tables: i64,
}

/// `GET /db-test` — opens the database and counts its tables.
pub async fn db_test(
    State(ctx): State<ApiContext>,
) -> Result<Json<ApiResponse<DbTestData>>, ApiError> {
    let conn = ctx.open_db()?;
    let tables = sqlite::count_tables(&conn)?;
    Ok(Json(ApiResponse::with_message(
        DbTestData { tables },
        "Database connection OK",
    )))
}
