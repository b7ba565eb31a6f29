//! API Module
//!
//! HTTP API layer of the server.
//! Each submodule handles endpoints for a specific domain.

pub mod auth;
pub mod error;
pub mod health;
pub mod job;
pub mod object;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    // Pre-signed object access, the only route that takes large bodies
    let objects = Router::new()
        .route(
            "/v1/objects/{*key}",
            get(object::get_object).put(object::put_object),
        )
        .layer(DefaultBodyLimit::max(state.max_upload_bytes));

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Authentication
        .route("/v1/auth/login", post(auth::login))
        // Job endpoints
        .route("/v1/jobs", post(job::create_job).get(job::list_jobs))
        .route("/v1/jobs/{id}", get(job::get_job))
        .route("/v1/jobs/{id}/process", post(job::process_job))
        .route("/v1/images/{id}", get(job::get_image))
        .merge(objects)
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
