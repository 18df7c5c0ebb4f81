//! Ranking endpoints

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use mediarank_common::models::{MediaCategory, Ranking};
use mediarank_common::upsert::{
    self, ImportedRanking, RankRequest, RankingEdit, UpsertKind, UpsertOutcome,
};
use mediarank_common::view::{arrange, CategoryFilter, SortKey};
use serde::{Deserialize, Serialize};

use crate::api::auth::AuthenticatedUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub media_id: String,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub ranked: bool,
    pub ranking: Option<Ranking>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub created: usize,
    pub updated: usize,
    pub rankings: Vec<Ranking>,
}

/// GET /api/rankings?sort=&category=
pub async fn list_rankings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Ranking>>> {
    let Query(query) = query?;
    let sort = match query.sort.as_deref() {
        Some(s) => s.parse()?,
        None => SortKey::default(),
    };
    let filter = match query.category.as_deref() {
        Some(c) => c.parse()?,
        None => CategoryFilter::All,
    };

    let rankings = state.store.list(user.id()).await?;
    Ok(Json(arrange(&rankings, sort, filter)))
}

/// POST /api/rankings
///
/// 201 when a ranking was created, 200 when an existing one was updated.
pub async fn rank_media(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<RankRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UpsertOutcome>)> {
    let Json(request) = body?;
    let outcome = upsert::upsert_ranking(state.store.as_ref(), Some(user.id()), request).await?;
    let status = match outcome.kind {
        UpsertKind::Created => StatusCode::CREATED,
        UpsertKind::Updated => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}

/// GET /api/rankings/lookup?media_id=
pub async fn lookup_ranking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    query: Result<Query<LookupQuery>, QueryRejection>,
) -> ApiResult<Json<LookupResponse>> {
    let Query(query) = query?;
    let ranking = state.store.find_by_media(user.id(), &query.media_id).await?;
    Ok(Json(LookupResponse {
        ranked: ranking.is_some(),
        ranking,
    }))
}

/// POST /api/rankings/import
pub async fn import_rankings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<Vec<ImportedRanking>>, JsonRejection>,
) -> ApiResult<Json<ImportResponse>> {
    let Json(records) = body?;
    let outcomes = upsert::import_rankings(state.store.as_ref(), Some(user.id()), records).await?;

    let created = outcomes
        .iter()
        .filter(|o| o.kind == UpsertKind::Created)
        .count();
    Ok(Json(ImportResponse {
        created,
        updated: outcomes.len() - created,
        rankings: outcomes.into_iter().map(|o| o.ranking).collect(),
    }))
}

/// PUT /api/rankings/:id
pub async fn update_ranking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    body: Result<Json<RankingEdit>, JsonRejection>,
) -> ApiResult<Json<Ranking>> {
    let Json(edit) = body?;
    let ranking = upsert::update_ranking(state.store.as_ref(), Some(user.id()), &id, edit).await?;
    Ok(Json(ranking))
}

/// DELETE /api/rankings/:id
pub async fn delete_ranking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    upsert::delete_ranking(state.store.as_ref(), Some(user.id()), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/rankings/category/:category
pub async fn rankings_by_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(category): Path<String>,
) -> ApiResult<Json<Vec<Ranking>>> {
    let category: MediaCategory = category.parse()?;
    Ok(Json(state.store.list_by_category(user.id(), category).await?))
}

pub fn ranking_routes() -> Router<AppState> {
    Router::new()
        .route("/api/rankings", get(list_rankings).post(rank_media))
        .route("/api/rankings/lookup", get(lookup_ranking))
        .route("/api/rankings/import", post(import_rankings))
        .route("/api/rankings/:id", put(update_ranking).delete(delete_ranking))
        .route("/api/rankings/category/:category", get(rankings_by_category))
}
