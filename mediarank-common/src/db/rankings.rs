//! SQLite-backed ranking store

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::db::init::begin_write;
use crate::models::{MediaCategory, MediaItem, Rank, Ranking, UserId};
use crate::store::RankingStore;
use crate::upsert::{plan_upsert, UpsertKind, UpsertOutcome, ValidatedRank};
use crate::{time, Error, Result};

const RANKING_COLUMNS: &str =
    "id, user_id, media_id, media_json, rank, notes, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct SqliteRankingStore {
    pool: SqlitePool,
}

impl SqliteRankingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn ranking_from_row(row: &SqliteRow) -> Result<Ranking> {
    let media_json: String = row.get("media_json");
    let media: MediaItem = serde_json::from_str(&media_json)?;

    Ok(Ranking {
        id: row.get("id"),
        user_id: row.get("user_id"),
        media_id: row.get("media_id"),
        media,
        rank: Rank::new(row.get::<i64, _>("rank"))?,
        notes: row.get("notes"),
        created_at: time::from_db_opt(row.get("created_at"))?,
        updated_at: time::from_db_opt(row.get("updated_at"))?,
    })
}

fn db_time(ranking_time: Option<&chrono::DateTime<chrono::Utc>>) -> Option<String> {
    ranking_time.map(time::to_db_string)
}

async fn insert_ranking(tx: &mut Transaction<'_, Sqlite>, ranking: &Ranking) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO rankings (id, user_id, media_id, category, media_json, rank, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&ranking.id)
    .bind(&ranking.user_id)
    .bind(&ranking.media_id)
    .bind(ranking.category().as_str())
    .bind(serde_json::to_string(&ranking.media)?)
    .bind(ranking.rank.value() as i64)
    .bind(&ranking.notes)
    .bind(db_time(ranking.created_at.as_ref()))
    .bind(db_time(ranking.updated_at.as_ref()))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn update_rank_and_notes(
    tx: &mut Transaction<'_, Sqlite>,
    ranking: &Ranking,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE rankings SET rank = ?, notes = ?, updated_at = ? WHERE id = ? AND user_id = ?",
    )
    .bind(ranking.rank.value() as i64)
    .bind(&ranking.notes)
    .bind(db_time(ranking.updated_at.as_ref()))
    .bind(&ranking.id)
    .bind(&ranking.user_id)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected())
}

/// Lookup by media id then insert or update, inside the caller's transaction
async fn upsert_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    user: &UserId,
    rank: ValidatedRank,
) -> Result<UpsertOutcome> {
    let existing = sqlx::query(&format!(
        "SELECT {} FROM rankings WHERE user_id = ? AND media_id = ?",
        RANKING_COLUMNS
    ))
    .bind(user.as_str())
    .bind(rank.media_id())
    .fetch_optional(&mut **tx)
    .await?
    .as_ref()
    .map(ranking_from_row)
    .transpose()?;

    if existing.is_none() {
        if let Some(id) = rank
            .import
            .as_ref()
            .and_then(|m| m.id.as_deref())
            .filter(|id| !id.trim().is_empty())
        {
            let taken: Option<i64> = sqlx::query_scalar("SELECT 1 FROM rankings WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
            if taken.is_some() {
                return Err(Error::Validation(format!("Ranking id {} is already in use", id)));
            }
        }
    }

    let outcome = plan_upsert(user, rank, existing, time::now());

    match outcome.kind {
        UpsertKind::Created => insert_ranking(tx, &outcome.ranking).await?,
        UpsertKind::Updated => {
            update_rank_and_notes(tx, &outcome.ranking).await?;
        }
    }

    debug!(
        user = %user,
        ranking_id = %outcome.ranking.id,
        kind = ?outcome.kind,
        "Wrote ranking upsert"
    );
    Ok(outcome)
}

#[async_trait]
impl RankingStore for SqliteRankingStore {
    async fn list(&self, user: &UserId) -> Result<Vec<Ranking>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM rankings WHERE user_id = ? ORDER BY updated_at DESC, created_at DESC",
            RANKING_COLUMNS
        ))
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(ranking_from_row).collect()
    }

    async fn list_by_category(&self, user: &UserId, category: MediaCategory) -> Result<Vec<Ranking>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM rankings WHERE user_id = ? AND category = ? ORDER BY rank DESC, created_at ASC",
            RANKING_COLUMNS
        ))
        .bind(user.as_str())
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(ranking_from_row).collect()
    }

    async fn get(&self, user: &UserId, ranking_id: &str) -> Result<Option<Ranking>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM rankings WHERE user_id = ? AND id = ?",
            RANKING_COLUMNS
        ))
        .bind(user.as_str())
        .bind(ranking_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(ranking_from_row).transpose()
    }

    async fn find_by_media(&self, user: &UserId, media_id: &str) -> Result<Option<Ranking>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM rankings WHERE user_id = ? AND media_id = ?",
            RANKING_COLUMNS
        ))
        .bind(user.as_str())
        .bind(media_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(ranking_from_row).transpose()
    }

    async fn upsert(&self, user: &UserId, rank: ValidatedRank) -> Result<UpsertOutcome> {
        let mut tx = begin_write(&self.pool).await?;
        let outcome = upsert_in_tx(&mut tx, user, rank).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn upsert_all(&self, user: &UserId, ranks: Vec<ValidatedRank>) -> Result<Vec<UpsertOutcome>> {
        let mut tx = begin_write(&self.pool).await?;
        let mut outcomes = Vec::with_capacity(ranks.len());
        for rank in ranks {
            // Dropping `tx` on error rolls back the whole batch
            outcomes.push(upsert_in_tx(&mut tx, user, rank).await?);
        }
        tx.commit().await?;
        Ok(outcomes)
    }

    async fn save(&self, ranking: &Ranking) -> Result<()> {
        let mut tx = begin_write(&self.pool).await?;
        if update_rank_and_notes(&mut tx, ranking).await? == 0 {
            return Err(Error::NotFound(format!("Ranking {}", ranking.id)));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, user: &UserId, ranking_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM rankings WHERE id = ? AND user_id = ?")
            .bind(ranking_id)
            .bind(user.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Ranking {}", ranking_id)));
        }
        Ok(())
    }
}
