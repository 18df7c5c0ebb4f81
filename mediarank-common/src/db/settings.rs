//! Key-value settings table access

use sqlx::{Pool, Sqlite};
use std::str::FromStr;

use crate::{time, Error, Result};

/// Settings key holding the API shared secret
pub const SHARED_SECRET_KEY: &str = "api_shared_secret";
/// Settings keys for search provider credentials
pub const TMDB_API_KEY: &str = "search_tmdb_api_key";
pub const BOOKS_API_KEY: &str = "search_books_api_key";
pub const GAMES_API_KEY: &str = "search_games_api_key";

/// Read and parse a setting; `None` when the key is absent or NULL
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;

    match value.flatten() {
        Some(s) => s.parse::<T>().map(Some).map_err(|_| {
            Error::Config(format!("Failed to parse setting '{}' value: {}", key, s))
        }),
        None => Ok(None),
    }
}

/// Insert or update a setting
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .bind(time::to_db_string(&time::now()))
    .execute(db)
    .await?;

    Ok(())
}
