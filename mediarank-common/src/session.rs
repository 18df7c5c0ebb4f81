//! Caller-side mirror of a user's rankings
//!
//! The store is authoritative. `RankingList` patches its local copy only after
//! a write succeeded, and every patch is keyed by ranking id so a late or
//! repeated patch leaves the same result.

use tracing::warn;

use crate::models::{Ranking, UserId};
use crate::stats::{compute_user_stats, UserStats};
use crate::store::RankingStore;
use crate::upsert::{self, RankRequest, RankingEdit, UpsertOutcome};
use crate::view::{arrange, CategoryFilter, SortKey};
use crate::Result;

#[derive(Debug, Clone)]
pub struct RankingList {
    user: UserId,
    rankings: Vec<Ranking>,
    last_stats: Option<UserStats>,
}

impl RankingList {
    /// Fetch the user's rankings from the store
    pub async fn load<S: RankingStore + ?Sized>(store: &S, user: Option<&UserId>) -> Result<Self> {
        let user = crate::models::require_user(user)?.clone();
        let rankings = store.list(&user).await?;
        Ok(Self {
            user,
            rankings,
            last_stats: None,
        })
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn rankings(&self) -> &[Ranking] {
        &self.rankings
    }

    /// Replace by id, or prepend when the id is new
    pub fn apply(&mut self, ranking: Ranking) {
        match self.rankings.iter_mut().find(|r| r.id == ranking.id) {
            Some(slot) => *slot = ranking,
            None => self.rankings.insert(0, ranking),
        }
    }

    pub fn remove(&mut self, ranking_id: &str) {
        self.rankings.retain(|r| r.id != ranking_id);
    }

    /// Re-fetch from the store; the local list is kept when the fetch fails
    pub async fn refresh<S: RankingStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        self.rankings = store.list(&self.user).await?;
        Ok(())
    }

    /// Rate a media item and patch the local list on success
    pub async fn rate<S: RankingStore + ?Sized>(
        &mut self,
        store: &S,
        request: RankRequest,
    ) -> Result<UpsertOutcome> {
        let outcome = upsert::upsert_ranking(store, Some(&self.user), request).await?;
        self.apply(outcome.ranking.clone());
        Ok(outcome)
    }

    pub async fn edit<S: RankingStore + ?Sized>(
        &mut self,
        store: &S,
        ranking_id: &str,
        edit: RankingEdit,
    ) -> Result<Ranking> {
        let ranking = upsert::update_ranking(store, Some(&self.user), ranking_id, edit).await?;
        self.apply(ranking.clone());
        Ok(ranking)
    }

    pub async fn delete<S: RankingStore + ?Sized>(&mut self, store: &S, ranking_id: &str) -> Result<()> {
        upsert::delete_ranking(store, Some(&self.user), ranking_id).await?;
        self.remove(ranking_id);
        Ok(())
    }

    /// Sorted/filtered view of the local list
    pub fn view(&self, sort: SortKey, filter: CategoryFilter) -> Vec<Ranking> {
        arrange(&self.rankings, sort, filter)
    }

    /// Statistics over the local list
    pub fn stats(&mut self) -> &UserStats {
        self.last_stats.insert(compute_user_stats(&self.rankings))
    }

    /// Re-fetch and recompute statistics
    ///
    /// On a store failure the previous summary (possibly stale, possibly none)
    /// is returned unchanged.
    pub async fn refresh_stats<S: RankingStore + ?Sized>(&mut self, store: &S) -> Option<&UserStats> {
        match self.refresh(store).await {
            Ok(()) => Some(self.stats()),
            Err(e) => {
                warn!(user = %self.user, "Failed to refresh statistics, keeping previous: {}", e);
                self.last_stats.as_ref()
            }
        }
    }

    pub fn last_stats(&self) -> Option<&UserStats> {
        self.last_stats.as_ref()
    }
}
