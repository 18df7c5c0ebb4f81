//! Request identity extraction
//!
//! Every `/api/*` handler takes an [`AuthenticatedUser`]. The identity
//! provider in front of the service sets `x-user-id`, `x-auth-timestamp`
//! (Unix ms) and `x-auth-hash`; see `mediarank_common::api::auth` for the
//! hash scheme. With a shared secret of 0 only `x-user-id` is checked.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use mediarank_common::api::auth::verify_identity;
use mediarank_common::models::UserId;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const TIMESTAMP_HEADER: &str = "x-auth-timestamp";
pub const HASH_HEADER: &str = "x-auth-hash";

/// The signed-in user a request acts for
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserId);

impl AuthenticatedUser {
    pub fn id(&self) -> &UserId {
        &self.0
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let timestamp = header(parts, TIMESTAMP_HEADER).and_then(|t| t.trim().parse::<i64>().ok());

        let user_id = verify_identity(
            header(parts, USER_ID_HEADER),
            timestamp,
            header(parts, HASH_HEADER),
            state.shared_secret,
        )
        .map_err(|e| {
            warn!(path = %parts.uri.path(), "Rejected request: {}", e);
            e
        })?;

        Ok(AuthenticatedUser(UserId::new(user_id)?))
    }
}
