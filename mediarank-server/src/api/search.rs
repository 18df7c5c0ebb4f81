//! Media search endpoint

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use mediarank_common::models::{MediaCategory, MediaItem};
use serde::Deserialize;

use crate::api::auth::AuthenticatedUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub category: String,
    pub q: String,
}

/// GET /api/search?category=&q=
pub async fn search_media(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<MediaItem>>> {
    let Query(query) = query?;
    let category: MediaCategory = query.category.parse()?;
    Ok(Json(state.search.search(category, &query.q).await?))
}

pub fn search_routes() -> Router<AppState> {
    Router::new().route("/api/search", get(search_media))
}
