//! Statistics endpoint

use axum::{extract::State, routing::get, Json, Router};
use mediarank_common::stats::{compute_user_stats, UserStats};

use crate::api::auth::AuthenticatedUser;
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/stats
pub async fn get_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserStats>> {
    let rankings = state.store.list(user.id()).await?;
    Ok(Json(compute_user_stats(&rankings)))
}

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/api/stats", get(get_stats))
}
