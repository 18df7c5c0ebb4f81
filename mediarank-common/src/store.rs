//! Ranking record store abstraction
//!
//! Rankings live in a per-user partition keyed by ranking id. Implementations
//! must make `upsert` atomic: the lookup by media id and the following write
//! happen in one transaction, so concurrent upserts for the same
//! (user, media) pair cannot produce duplicates or lose an update.

use async_trait::async_trait;

use crate::models::{MediaCategory, Ranking, UserId};
use crate::upsert::{UpsertOutcome, ValidatedRank};
use crate::Result;

#[async_trait]
pub trait RankingStore: Send + Sync {
    /// All rankings of a user, most recently updated first
    async fn list(&self, user: &UserId) -> Result<Vec<Ranking>>;

    /// Rankings of one category, highest rank first
    async fn list_by_category(&self, user: &UserId, category: MediaCategory) -> Result<Vec<Ranking>>;

    async fn get(&self, user: &UserId, ranking_id: &str) -> Result<Option<Ranking>>;

    /// The user's ranking for a media id, if any
    async fn find_by_media(&self, user: &UserId, media_id: &str) -> Result<Option<Ranking>>;

    /// Create or update the ranking for `rank.media.id` in one transaction
    async fn upsert(&self, user: &UserId, rank: ValidatedRank) -> Result<UpsertOutcome>;

    /// Upsert every rank in order, all in one transaction; on error nothing
    /// is written
    async fn upsert_all(&self, user: &UserId, ranks: Vec<ValidatedRank>) -> Result<Vec<UpsertOutcome>>;

    /// Overwrite an existing ranking by id (`NotFound` if absent)
    async fn save(&self, ranking: &Ranking) -> Result<()>;

    /// Delete by id (`NotFound` if absent)
    async fn delete(&self, user: &UserId, ranking_id: &str) -> Result<()>;
}
