//! Rank upsert logic
//!
//! One ranking per (user, media id). Re-ranking the same media updates the
//! existing record in place; it never inserts a second row.
//!
//! The decision itself is the pure [`plan_upsert`]; stores call it inside
//! their transaction with whatever record the lookup returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error, info};

use crate::models::{require_user, MediaItem, Rank, Ranking, UserId};
use crate::store::RankingStore;
use crate::{time, uuid_utils, Error, Result};

/// Raw request to rate a media item
#[derive(Debug, Clone, Deserialize)]
pub struct RankRequest {
    pub rank: i64,
    #[serde(default)]
    pub notes: Option<String>,
    pub media: MediaItem,
}

/// Identity and timestamps carried over from an imported record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportMeta {
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A rank request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRank {
    pub rank: Rank,
    /// Trimmed notes; `None` when absent or blank
    pub notes: Option<String>,
    pub media: MediaItem,
    pub import: Option<ImportMeta>,
}

impl ValidatedRank {
    pub fn media_id(&self) -> &str {
        &self.media.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertKind {
    Created,
    Updated,
}

/// Result of an upsert: what happened and the persisted record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertOutcome {
    pub kind: UpsertKind,
    pub ranking: Ranking,
}

/// Trim notes; blank notes count as absent
pub fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Validate a raw request without touching any store
pub fn validate(request: RankRequest) -> Result<ValidatedRank> {
    let rank = Rank::new(request.rank)?;
    if request.media.id.trim().is_empty() {
        return Err(Error::Validation("Media identifier is required".to_string()));
    }
    Ok(ValidatedRank {
        rank,
        notes: normalize_notes(request.notes),
        media: request.media,
        import: None,
    })
}

/// Decide the record to write given the existing ranking for the same media
///
/// Existing: keeps id, `created_at` and the media snapshot; takes the new
/// rank; takes the new notes only when present. New: fresh id (or the
/// imported one) and `created_at = updated_at = now`.
pub fn plan_upsert(
    user: &UserId,
    request: ValidatedRank,
    existing: Option<Ranking>,
    now: DateTime<Utc>,
) -> UpsertOutcome {
    match existing {
        Some(mut ranking) => {
            ranking.rank = request.rank;
            if request.notes.is_some() {
                ranking.notes = request.notes;
            }
            ranking.updated_at = Some(now);
            UpsertOutcome {
                kind: UpsertKind::Updated,
                ranking,
            }
        }
        None => {
            let (id, created_at, updated_at) = match request.import {
                Some(meta) => (
                    meta.id
                        .filter(|id| !id.trim().is_empty())
                        .unwrap_or_else(uuid_utils::generate),
                    meta.created_at,
                    meta.updated_at,
                ),
                None => (uuid_utils::generate(), Some(now), Some(now)),
            };
            UpsertOutcome {
                kind: UpsertKind::Created,
                ranking: Ranking {
                    id,
                    user_id: user.as_str().to_string(),
                    media_id: request.media.id.clone(),
                    media: request.media,
                    rank: request.rank,
                    notes: request.notes,
                    created_at,
                    updated_at,
                },
            }
        }
    }
}

/// Rate a media item for the signed-in user
///
/// Fails with `Authentication` before touching the store when no user is
/// given, and with `Validation` (store untouched) on a bad rank.
pub async fn upsert_ranking<S: RankingStore + ?Sized>(
    store: &S,
    user: Option<&UserId>,
    request: RankRequest,
) -> Result<UpsertOutcome> {
    let user = require_user(user)?;
    let validated = validate(request)?;
    let media_id = validated.media_id().to_string();

    match store.upsert(user, validated).await {
        Ok(outcome) => {
            info!(
                user = %user,
                media_id = %media_id,
                ranking_id = %outcome.ranking.id,
                kind = ?outcome.kind,
                "Saved ranking"
            );
            Ok(outcome)
        }
        Err(e) => {
            error!(user = %user, media_id = %media_id, "Failed to save ranking: {}", e);
            Err(e)
        }
    }
}

/// Edit of an existing ranking from the edit dialog
#[derive(Debug, Clone, Deserialize)]
pub struct RankingEdit {
    pub rank: i64,
    /// Replaces the stored notes; blank clears them
    #[serde(default)]
    pub notes: Option<String>,
}

/// Overwrite rank and notes of an existing ranking by id
pub async fn update_ranking<S: RankingStore + ?Sized>(
    store: &S,
    user: Option<&UserId>,
    ranking_id: &str,
    edit: RankingEdit,
) -> Result<Ranking> {
    let user = require_user(user)?;
    let rank = Rank::new(edit.rank)?;

    let mut ranking = store
        .get(user, ranking_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Ranking {}", ranking_id)))?;

    ranking.rank = rank;
    ranking.notes = normalize_notes(edit.notes);
    ranking.updated_at = Some(time::now());

    store.save(&ranking).await.map_err(|e| {
        error!(user = %user, ranking_id = %ranking_id, "Failed to update ranking: {}", e);
        e
    })?;
    debug!(user = %user, ranking_id = %ranking_id, "Updated ranking");
    Ok(ranking)
}

/// Delete one of the user's rankings
pub async fn delete_ranking<S: RankingStore + ?Sized>(
    store: &S,
    user: Option<&UserId>,
    ranking_id: &str,
) -> Result<()> {
    let user = require_user(user)?;
    store.delete(user, ranking_id).await.map_err(|e| {
        error!(user = %user, ranking_id = %ranking_id, "Failed to delete ranking: {}", e);
        e
    })?;
    info!(user = %user, ranking_id = %ranking_id, "Deleted ranking");
    Ok(())
}

/// One record of a batch import
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedRanking {
    #[serde(default)]
    pub id: Option<String>,
    pub rank: i64,
    #[serde(default)]
    pub notes: Option<String>,
    pub media: MediaItem,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Batch import
///
/// Every record is validated before anything is written, and the batch is
/// written in one store transaction: either all records land or none do.
/// Each record goes through the normal per-media upsert, so importing a media
/// id that is already ranked updates that ranking instead of duplicating it.
/// A supplied id that repeats within the batch or belongs to another ranking
/// is a `Validation` error.
pub async fn import_rankings<S: RankingStore + ?Sized>(
    store: &S,
    user: Option<&UserId>,
    records: Vec<ImportedRanking>,
) -> Result<Vec<UpsertOutcome>> {
    let user = require_user(user)?;

    let validated = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let meta = ImportMeta {
                id: record.id,
                created_at: record.created_at,
                updated_at: record.updated_at,
            };
            validate(RankRequest {
                rank: record.rank,
                notes: record.notes,
                media: record.media,
            })
            .map(|v| ValidatedRank {
                import: Some(meta),
                ..v
            })
            .map_err(|e| Error::Validation(format!("Record {}: {}", index, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for id in validated
        .iter()
        .filter_map(|v| v.import.as_ref()?.id.as_deref())
        .filter(|id| !id.trim().is_empty())
    {
        if !seen.insert(id) {
            return Err(Error::Validation(format!(
                "Ranking id {} appears more than once",
                id
            )));
        }
    }

    let outcomes = store.upsert_all(user, validated).await.map_err(|e| {
        error!(user = %user, "Failed to import rankings: {}", e);
        e
    })?;
    info!(user = %user, count = outcomes.len(), "Imported rankings");
    Ok(outcomes)
}
