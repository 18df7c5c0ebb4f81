//! mediarank-server library
//!
//! HTTP service for per-user media rankings, statistics, profiles and
//! families. Handlers live in [`api`]; external search clients in [`search`].

use axum::Router;
use mediarank_common::db::SqliteRankingStore;
use mediarank_common::store::RankingStore;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod search;

use search::SearchService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub store: Arc<dyn RankingStore>,
    /// Identity hash secret; 0 disables hash checking
    pub shared_secret: i64,
    pub search: SearchService,
}

impl AppState {
    /// State backed by the SQLite ranking store on `db`
    pub fn new(db: SqlitePool, shared_secret: i64, search: SearchService) -> Self {
        let store: Arc<dyn RankingStore> = Arc::new(SqliteRankingStore::new(db.clone()));
        Self {
            db,
            store,
            shared_secret,
            search,
        }
    }
}

/// Build application router
///
/// `/health` is public; every `/api/*` handler extracts an authenticated user.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(api::ranking_routes())
        .merge(api::stats_routes())
        .merge(api::profile_routes())
        .merge(api::family_routes())
        .merge(api::search_routes());

    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
