//! User profile persistence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::db::init::begin_write;
use crate::models::{FamilyLink, ProfileUpdate, UserId, UserProfile};
use crate::{time, Result};

const PROFILE_COLUMNS: &str = "uid, email, display_name, bio, photo_url, favorite_genres, \
     family_id, family_role, family_joined_at, created_at, updated_at";

fn profile_from_row(row: &SqliteRow) -> Result<UserProfile> {
    let genres: String = row.get("favorite_genres");
    let family_id: Option<String> = row.get("family_id");
    let family_role: Option<String> = row.get("family_role");

    let family = match (family_id, family_role) {
        (Some(family_id), Some(role)) => Some(FamilyLink {
            family_id,
            role: role.parse()?,
            joined_at: time::from_db_opt(row.get("family_joined_at"))?,
        }),
        _ => None,
    };

    Ok(UserProfile {
        uid: row.get("uid"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        bio: row.get("bio"),
        photo_url: row.get("photo_url"),
        favorite_genres: serde_json::from_str(&genres)?,
        created_at: time::from_db_opt(row.get("created_at"))?,
        updated_at: time::from_db_opt(row.get("updated_at"))?,
        family,
    })
}

async fn fetch_profile(conn: &mut SqliteConnection, uid: &str) -> Result<Option<UserProfile>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM user_profiles WHERE uid = ?",
        PROFILE_COLUMNS
    ))
    .bind(uid)
    .fetch_optional(conn)
    .await?;
    row.as_ref().map(profile_from_row).transpose()
}

pub async fn get_profile(pool: &SqlitePool, uid: &str) -> Result<Option<UserProfile>> {
    let mut conn = pool.acquire().await?;
    fetch_profile(&mut conn, uid).await
}

/// Exact display name match, newest first
pub async fn profiles_by_display_name(pool: &SqlitePool, name: &str) -> Result<Vec<UserProfile>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM user_profiles WHERE display_name = ? ORDER BY created_at DESC",
        PROFILE_COLUMNS
    ))
    .bind(name)
    .fetch_all(pool)
    .await?;
    rows.iter().map(profile_from_row).collect()
}

/// Write a full profile, keeping the stored `created_at` if there is one
async fn write_profile(conn: &mut SqliteConnection, profile: &UserProfile) -> Result<()> {
    let family = profile.family.as_ref();
    sqlx::query(&format!(
        r#"
        INSERT INTO user_profiles ({})
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(uid) DO UPDATE SET
            email = excluded.email,
            display_name = excluded.display_name,
            bio = excluded.bio,
            photo_url = excluded.photo_url,
            favorite_genres = excluded.favorite_genres,
            family_id = excluded.family_id,
            family_role = excluded.family_role,
            family_joined_at = excluded.family_joined_at,
            created_at = COALESCE(user_profiles.created_at, excluded.created_at),
            updated_at = excluded.updated_at
        "#,
        PROFILE_COLUMNS
    ))
    .bind(&profile.uid)
    .bind(&profile.email)
    .bind(&profile.display_name)
    .bind(&profile.bio)
    .bind(&profile.photo_url)
    .bind(serde_json::to_string(&profile.favorite_genres)?)
    .bind(family.map(|f| f.family_id.clone()))
    .bind(family.map(|f| f.role.as_str()))
    .bind(family.and_then(|f| f.joined_at.as_ref()).map(time::to_db_string))
    .bind(profile.created_at.as_ref().map(time::to_db_string))
    .bind(profile.updated_at.as_ref().map(time::to_db_string))
    .execute(conn)
    .await?;
    Ok(())
}

/// Merge a partial update into the user's profile, creating it if missing
///
/// A new profile takes its display name from the update, else the user id.
pub async fn upsert_profile(
    pool: &SqlitePool,
    user: &UserId,
    update: ProfileUpdate,
) -> Result<UserProfile> {
    let now = time::now();
    let mut tx = begin_write(pool).await?;
    let mut profile = match fetch_profile(&mut tx, user.as_str()).await? {
        Some(existing) => existing,
        None => {
            let mut fresh = UserProfile::new(user.as_str(), user.as_str());
            fresh.created_at = Some(now);
            fresh
        }
    };

    update.apply_to(&mut profile);
    profile.updated_at = Some(now);
    write_profile(&mut tx, &profile).await?;
    tx.commit().await?;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::open_in_memory;

    #[tokio::test]
    async fn test_upsert_creates_then_merges() {
        let pool = open_in_memory().await.unwrap();
        let user = UserId::new("u1").unwrap();

        let created = upsert_profile(
            &pool,
            &user,
            ProfileUpdate {
                display_name: Some("Ada".to_string()),
                favorite_genres: Some(vec!["sci-fi".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(created.display_name, "Ada");

        let updated = upsert_profile(
            &pool,
            &user,
            ProfileUpdate {
                bio: Some("Reads a lot".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.display_name, "Ada");
        assert_eq!(updated.bio, "Reads a lot");
        assert_eq!(updated.favorite_genres, vec!["sci-fi".to_string()]);
        assert_eq!(updated.created_at, created.created_at);

        let loaded = get_profile(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(loaded, updated);
    }

    #[tokio::test]
    async fn test_profiles_by_display_name_is_exact() {
        let pool = open_in_memory().await.unwrap();
        for (uid, name) in [("a", "Sam"), ("b", "Sam"), ("c", "Samantha")] {
            upsert_profile(
                &pool,
                &UserId::new(uid).unwrap(),
                ProfileUpdate {
                    display_name: Some(name.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        let found = profiles_by_display_name(&pool, "Sam").await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.display_name == "Sam"));
    }
}
