//! Health check endpoint

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ViewRegistry;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Name of the configured tracing backend
    pub backend: &'static str,
    /// Live view sessions
    pub views: u64,
}

pub fn routes(views: ViewRegistry) -> Router<()> {
    Router::new()
        .route("/api/v1/health", get(health))
        .with_state(views)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(views): State<ViewRegistry>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: views.backend().name(),
        views: views.len(),
    })
}
