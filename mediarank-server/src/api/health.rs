//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Categories with a configured search provider
    pub search: Vec<String>,
}

/// GET /health
///
/// No authentication.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let search = mediarank_common::models::MediaCategory::ALL
        .iter()
        .filter(|c| state.search.is_enabled(**c))
        .map(|c| c.to_string())
        .collect();

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "mediarank-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        search,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
