//! Database initialization
//!
//! Creates the database file on first run and brings the schema up to date.
//! Every statement is idempotent, so this runs on each startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, Sqlite, SqlitePool, Transaction};
use std::path::Path;
use tracing::info;

/// Begin a write transaction holding the database write lock from the start
///
/// A deferred transaction that reads before writing gets SQLITE_BUSY without
/// waiting if another writer commits in between. `BEGIN IMMEDIATE` waits on
/// busy_timeout instead.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Open (or create) the database at `db_path` and initialize the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets the many readers proceed while one upsert transaction writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    init_schema(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// Each SQLite `:memory:` connection is its own database, hence one connection.
pub async fn open_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes if missing
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_settings_table(pool).await?;
    create_user_profiles_table(pool).await?;
    create_rankings_table(pool).await?;
    create_families_table(pool).await?;
    create_family_member_roles_table(pool).await?;
    Ok(())
}

/// Create the settings table
///
/// Key-value pairs: API shared secret, search provider keys.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_user_profiles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_profiles (
            uid TEXT PRIMARY KEY,
            email TEXT,
            display_name TEXT NOT NULL,
            bio TEXT NOT NULL DEFAULT '',
            photo_url TEXT,
            favorite_genres TEXT NOT NULL DEFAULT '[]',
            family_id TEXT,
            family_role TEXT,
            family_joined_at TEXT,
            created_at TEXT,
            updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_user_profiles_display_name ON user_profiles(display_name)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the rankings table
///
/// One row per (user_id, media_id). The unique index backs up the
/// transactional upsert; the media snapshot is stored as JSON.
pub async fn create_rankings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rankings (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            media_id TEXT NOT NULL,
            category TEXT NOT NULL,
            media_json TEXT NOT NULL,
            rank INTEGER NOT NULL CHECK (rank BETWEEN 1 AND 5),
            notes TEXT,
            created_at TEXT,
            updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_rankings_user_media ON rankings(user_id, media_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_rankings_user_updated ON rankings(user_id, updated_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_families_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS families (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            created_by TEXT NOT NULL,
            member_ids TEXT NOT NULL DEFAULT '[]',
            settings_json TEXT NOT NULL,
            created_at TEXT,
            updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_family_member_roles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS family_member_roles (
            family_id TEXT NOT NULL REFERENCES families(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL,
            joined_at TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT,
            PRIMARY KEY (family_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_family_member_roles_user ON family_member_roles(user_id, role)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
