pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /images/generations          submit job (POST)
/// /images/generations/{id}     poll job status (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/images/generations",
            post(handlers::images::submit_image_job),
        )
        .route(
            "/images/generations/{id}",
            get(handlers::images::get_image_job),
        )
}
