//! Administration API router.
//!
//! Returns a composable `Router` that can be mounted on any axum
//! server. Routes live at the root, no prefix. Every handler opens its
//! own database connection through [`ApiContext`].

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the administration API router.
///
/// PUT and PATCH share one update handler: both merge the provided
/// fields into the stored record.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/status", get(endpoints::status::status))
        .route("/db-test", get(endpoints::status::db_test))
        .route(
            "/clients",
            get(endpoints::clients::index).post(endpoints::clients::store),
        )
        .route(
            "/clients/:id",
            get(endpoints::clients::show)
                .put(endpoints::clients::update)
                .patch(endpoints::clients::update)
                .delete(endpoints::clients::destroy),
        )
        .route(
            "/programs",
            get(endpoints::programs::index).post(endpoints::programs::store),
        )
        .route(
            "/programs/:id",
            get(endpoints::programs::show)
                .put(endpoints::programs::update)
                .patch(endpoints::programs::update)
                .delete(endpoints::programs::destroy),
        )
        .route("/enrollments", post(endpoints::enrollments::store))
        .route(
            "/public/clients/:id/profile",
            get(endpoints::public::profile),
        )
        .with_state(ctx)
        // Browser admin frontends run on a different origin in dev.
        .layer(CorsLayer::permissive())
}
