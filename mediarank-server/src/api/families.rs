//! Family endpoints
//!
//! Reading or changing a family requires membership. Deleting it requires
//! being its creator.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use mediarank_common::db::{families, users};
use mediarank_common::family::{
    Family, FamilyMemberRole, FamilyRole, FamilySettings, FamilySettingsUpdate,
};
use mediarank_common::models::UserId;
use mediarank_common::stats::{compute_user_stats, UserStats};
use mediarank_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::api::auth::AuthenticatedUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FamiliesQuery {
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFamilyRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFamilyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: String,
    pub role: FamilyRole,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: FamilyRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStats {
    pub user_id: String,
    pub display_name: Option<String>,
    pub role: Option<FamilyRole>,
    pub stats: UserStats,
}

/// Load a family the user belongs to
async fn member_family(pool: &SqlitePool, family_id: &str, user: &UserId) -> Result<Family> {
    let family = families::get_family(pool, family_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Family {}", family_id)))?;
    if !family.is_member(user.as_str()) {
        return Err(Error::Forbidden("Not a member of this family".to_string()));
    }
    Ok(family)
}

/// GET /api/families?role=
pub async fn list_families(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    query: std::result::Result<Query<FamiliesQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Family>>> {
    let Query(query) = query?;
    let list = match query.role.as_deref() {
        Some(role) => families::families_for_user_by_role(&state.db, user.id(), role.parse()?).await?,
        None => families::families_for_user(&state.db, user.id()).await?,
    };
    Ok(Json(list))
}

/// POST /api/families
pub async fn create_family(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: std::result::Result<Json<CreateFamilyRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Family>)> {
    let Json(request) = body?;
    let family =
        families::create_family(&state.db, user.id(), &request.name, request.description).await?;
    Ok((StatusCode::CREATED, Json(family)))
}

/// GET /api/families/:id
pub async fn get_family(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Family>> {
    Ok(Json(member_family(&state.db, &id, user.id()).await?))
}

/// PUT /api/families/:id
pub async fn update_family(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateFamilyRequest>, JsonRejection>,
) -> ApiResult<Json<Family>> {
    let Json(request) = body?;
    member_family(&state.db, &id, user.id()).await?;
    let family = families::update_family(&state.db, &id, request.name, request.description).await?;
    Ok(Json(family))
}

/// DELETE /api/families/:id
pub async fn delete_family(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    families::delete_family(&state.db, &id, user.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/families/:id/settings
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    body: std::result::Result<Json<FamilySettingsUpdate>, JsonRejection>,
) -> ApiResult<Json<FamilySettings>> {
    let Json(update) = body?;
    member_family(&state.db, &id, user.id()).await?;
    Ok(Json(families::update_settings(&state.db, &id, update).await?))
}

/// GET /api/families/:id/members
pub async fn list_members(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<FamilyMemberRole>>> {
    member_family(&state.db, &id, user.id()).await?;
    Ok(Json(families::member_roles(&state.db, &id).await?))
}

/// POST /api/families/:id/members
pub async fn add_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    body: std::result::Result<Json<AddMemberRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<FamilyMemberRole>)> {
    let Json(request) = body?;
    member_family(&state.db, &id, user.id()).await?;
    let member = families::add_member(&state.db, &id, &request.user_id, request.role).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// PUT /api/families/:id/members/:uid
pub async fn update_member_role(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, uid)): Path<(String, String)>,
    body: std::result::Result<Json<RoleRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(request) = body?;
    member_family(&state.db, &id, user.id()).await?;
    families::update_member_role(&state.db, &id, &uid, request.role).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/families/:id/members/:uid
pub async fn remove_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, uid)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    member_family(&state.db, &id, user.id()).await?;
    families::remove_member(&state.db, &id, &uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/families/:id/stats
///
/// Statistics for every member, in join order.
pub async fn family_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<MemberStats>>> {
    let family = member_family(&state.db, &id, user.id()).await?;

    let mut out = Vec::with_capacity(family.member_ids.len());
    for member_id in &family.member_ids {
        let member = UserId::new(member_id.as_str())?;
        let rankings = state.store.list(&member).await?;
        let display_name = users::get_profile(&state.db, member_id)
            .await?
            .map(|p| p.display_name);

        out.push(MemberStats {
            user_id: member_id.clone(),
            display_name,
            role: families::role_of(&state.db, &id, member_id).await?,
            stats: compute_user_stats(&rankings),
        });
    }
    Ok(Json(out))
}

pub fn family_routes() -> Router<AppState> {
    Router::new()
        .route("/api/families", get(list_families).post(create_family))
        .route(
            "/api/families/:id",
            get(get_family).put(update_family).delete(delete_family),
        )
        .route("/api/families/:id/settings", put(update_settings))
        .route("/api/families/:id/members", get(list_members).post(add_member))
        .route(
            "/api/families/:id/members/:uid",
            put(update_member_role).delete(remove_member),
        )
        .route("/api/families/:id/stats", get(family_stats))
}
