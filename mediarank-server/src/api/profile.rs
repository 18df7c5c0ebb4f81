//! Profile and user lookup endpoints

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use mediarank_common::db::users;
use mediarank_common::models::{ProfileUpdate, UserProfile};
use mediarank_common::Error;
use serde::Deserialize;

use crate::api::auth::AuthenticatedUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub display_name: String,
}

/// GET /api/profile
pub async fn get_own_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserProfile>> {
    let profile = users::get_profile(&state.db, user.id().as_str())
        .await?
        .ok_or_else(|| Error::NotFound("Profile not created yet".to_string()))?;
    Ok(Json(profile))
}

/// PUT /api/profile
///
/// Fields missing from the body keep their stored values.
pub async fn update_own_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Json<UserProfile>> {
    let Json(update) = body?;
    if update
        .display_name
        .as_deref()
        .is_some_and(|n| n.trim().is_empty())
    {
        return Err(Error::Validation("Display name cannot be blank".to_string()).into());
    }
    Ok(Json(users::upsert_profile(&state.db, user.id(), update).await?))
}

/// GET /api/users/:uid
pub async fn get_user(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(uid): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let profile = users::get_profile(&state.db, &uid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {}", uid)))?;
    Ok(Json(profile))
}

/// GET /api/users?display_name=
pub async fn find_users(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    query: Result<Query<UsersQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    let Query(query) = query?;
    Ok(Json(
        users::profiles_by_display_name(&state.db, &query.display_name).await?,
    ))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/api/profile", get(get_own_profile).put(update_own_profile))
        .route("/api/users", get(find_users))
        .route("/api/users/:uid", get(get_user))
}
