//! Family and membership persistence
//!
//! `families.member_ids` (JSON array, join order) and the
//! `family_member_roles` rows are always written in the same transaction.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::info;

use crate::db::init::begin_write;
use crate::family::{Family, FamilyMemberRole, FamilyRole, FamilySettings, FamilySettingsUpdate};
use crate::models::UserId;
use crate::{time, uuid_utils, Error, Result};

const FAMILY_COLUMNS: &str =
    "id, name, description, created_by, member_ids, settings_json, created_at, updated_at";

fn family_from_row(row: &SqliteRow) -> Result<Family> {
    let member_ids: String = row.get("member_ids");
    let settings_json: String = row.get("settings_json");

    Ok(Family {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_by: row.get("created_by"),
        member_ids: serde_json::from_str(&member_ids)?,
        settings: serde_json::from_str(&settings_json)?,
        created_at: time::from_db_opt(row.get("created_at"))?,
        updated_at: time::from_db_opt(row.get("updated_at"))?,
    })
}

fn role_from_row(row: &SqliteRow) -> Result<FamilyMemberRole> {
    let role: String = row.get("role");
    Ok(FamilyMemberRole {
        user_id: row.get("user_id"),
        family_id: row.get("family_id"),
        role: role.parse()?,
        joined_at: time::from_db_opt(row.get("joined_at"))?,
        is_active: row.get::<i64, _>("is_active") != 0,
    })
}

async fn fetch_family_tx(tx: &mut Transaction<'_, Sqlite>, family_id: &str) -> Result<Family> {
    let row = sqlx::query(&format!("SELECT {} FROM families WHERE id = ?", FAMILY_COLUMNS))
        .bind(family_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Family {}", family_id)))?;
    family_from_row(&row)
}

async fn write_member_ids(
    tx: &mut Transaction<'_, Sqlite>,
    family_id: &str,
    member_ids: &[String],
    now: &str,
) -> Result<()> {
    sqlx::query("UPDATE families SET member_ids = ?, updated_at = ? WHERE id = ?")
        .bind(serde_json::to_string(member_ids)?)
        .bind(now)
        .bind(family_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_role(
    tx: &mut Transaction<'_, Sqlite>,
    role: &FamilyMemberRole,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO family_member_roles (family_id, user_id, role, joined_at, is_active, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&role.family_id)
    .bind(&role.user_id)
    .bind(role.role.as_str())
    .bind(role.joined_at.as_ref().map(time::to_db_string))
    .bind(role.is_active as i64)
    .bind(role.joined_at.as_ref().map(time::to_db_string))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Create a family with the creator as its only member, in the parent role
pub async fn create_family(
    pool: &SqlitePool,
    creator: &UserId,
    name: &str,
    description: Option<String>,
) -> Result<Family> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("Family name is required".to_string()));
    }

    let now = time::now();
    let family = Family {
        id: uuid_utils::generate(),
        name: name.to_string(),
        description: description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
        created_at: Some(now),
        updated_at: Some(now),
        created_by: creator.as_str().to_string(),
        member_ids: vec![creator.as_str().to_string()],
        settings: FamilySettings::default(),
    };

    let mut tx = begin_write(pool).await?;
    sqlx::query(&format!(
        "INSERT INTO families ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        FAMILY_COLUMNS
    ))
    .bind(&family.id)
    .bind(&family.name)
    .bind(&family.description)
    .bind(&family.created_by)
    .bind(serde_json::to_string(&family.member_ids)?)
    .bind(serde_json::to_string(&family.settings)?)
    .bind(time::to_db_string(&now))
    .bind(time::to_db_string(&now))
    .execute(&mut *tx)
    .await?;

    insert_role(
        &mut tx,
        &FamilyMemberRole {
            user_id: creator.as_str().to_string(),
            family_id: family.id.clone(),
            role: FamilyRole::Parent,
            joined_at: Some(now),
            is_active: true,
        },
    )
    .await?;
    tx.commit().await?;

    info!(family_id = %family.id, creator = %creator, "Created family");
    Ok(family)
}

pub async fn get_family(pool: &SqlitePool, family_id: &str) -> Result<Option<Family>> {
    let row = sqlx::query(&format!("SELECT {} FROM families WHERE id = ?", FAMILY_COLUMNS))
        .bind(family_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(family_from_row).transpose()
}

/// Families the user belongs to, newest first
pub async fn families_for_user(pool: &SqlitePool, user: &UserId) -> Result<Vec<Family>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {} FROM families
        WHERE EXISTS (SELECT 1 FROM json_each(families.member_ids) WHERE json_each.value = ?)
        ORDER BY created_at DESC, rowid DESC
        "#,
        FAMILY_COLUMNS
    ))
    .bind(user.as_str())
    .fetch_all(pool)
    .await?;
    rows.iter().map(family_from_row).collect()
}

/// Families where the user holds `role` (active role records only)
pub async fn families_for_user_by_role(
    pool: &SqlitePool,
    user: &UserId,
    role: FamilyRole,
) -> Result<Vec<Family>> {
    let rows = sqlx::query(
        r#"
        SELECT f.id, f.name, f.description, f.created_by, f.member_ids, f.settings_json,
               f.created_at, f.updated_at
        FROM families f
        JOIN family_member_roles r ON r.family_id = f.id
        WHERE r.user_id = ? AND r.role = ? AND r.is_active = 1
        ORDER BY f.created_at DESC, f.rowid DESC
        "#,
    )
    .bind(user.as_str())
    .bind(role.as_str())
    .fetch_all(pool)
    .await?;
    rows.iter().map(family_from_row).collect()
}

/// Add a user to a family
///
/// `NotFound` if the family does not exist, `Conflict` if already a member.
pub async fn add_member(
    pool: &SqlitePool,
    family_id: &str,
    user_id: &str,
    role: FamilyRole,
) -> Result<FamilyMemberRole> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(Error::Validation("User id is required".to_string()));
    }

    let mut tx = begin_write(pool).await?;
    let mut family = fetch_family_tx(&mut tx, family_id).await?;
    if family.is_member(user_id) {
        return Err(Error::Conflict(format!(
            "User {} is already a member of this family",
            user_id
        )));
    }

    let now = time::now();
    family.member_ids.push(user_id.to_string());
    write_member_ids(&mut tx, family_id, &family.member_ids, &time::to_db_string(&now)).await?;

    let member = FamilyMemberRole {
        user_id: user_id.to_string(),
        family_id: family_id.to_string(),
        role,
        joined_at: Some(now),
        is_active: true,
    };
    // A stale inactive role row for this pair would block the insert
    sqlx::query("DELETE FROM family_member_roles WHERE family_id = ? AND user_id = ?")
        .bind(family_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    insert_role(&mut tx, &member).await?;
    tx.commit().await?;

    info!(family_id = %family_id, user_id = %user_id, role = %role, "Added family member");
    Ok(member)
}

/// Remove a user from a family; removing a non-member is a no-op
pub async fn remove_member(pool: &SqlitePool, family_id: &str, user_id: &str) -> Result<()> {
    let mut tx = begin_write(pool).await?;
    let mut family = fetch_family_tx(&mut tx, family_id).await?;

    family.member_ids.retain(|id| id != user_id);
    write_member_ids(
        &mut tx,
        family_id,
        &family.member_ids,
        &time::to_db_string(&time::now()),
    )
    .await?;

    sqlx::query("DELETE FROM family_member_roles WHERE family_id = ? AND user_id = ?")
        .bind(family_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(family_id = %family_id, user_id = %user_id, "Removed family member");
    Ok(())
}

pub async fn update_member_role(
    pool: &SqlitePool,
    family_id: &str,
    user_id: &str,
    role: FamilyRole,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE family_member_roles SET role = ?, updated_at = ? WHERE family_id = ? AND user_id = ?",
    )
    .bind(role.as_str())
    .bind(time::to_db_string(&time::now()))
    .bind(family_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "Member role for {} in family {}",
            user_id, family_id
        )));
    }
    Ok(())
}

/// Rename or re-describe a family; `None` fields are left as stored
pub async fn update_family(
    pool: &SqlitePool,
    family_id: &str,
    name: Option<String>,
    description: Option<String>,
) -> Result<Family> {
    let mut tx = begin_write(pool).await?;
    let mut family = fetch_family_tx(&mut tx, family_id).await?;

    if let Some(name) = name {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Family name is required".to_string()));
        }
        family.name = name.to_string();
    }
    if let Some(description) = description {
        family.description = Some(description.trim().to_string()).filter(|d| !d.is_empty());
    }
    let now = time::now();
    family.updated_at = Some(now);

    sqlx::query("UPDATE families SET name = ?, description = ?, updated_at = ? WHERE id = ?")
        .bind(&family.name)
        .bind(&family.description)
        .bind(time::to_db_string(&now))
        .bind(family_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(family)
}

/// Merge a partial settings update into the stored settings
pub async fn update_settings(
    pool: &SqlitePool,
    family_id: &str,
    update: FamilySettingsUpdate,
) -> Result<FamilySettings> {
    let mut tx = begin_write(pool).await?;
    let mut family = fetch_family_tx(&mut tx, family_id).await?;
    family.settings.merge(update);

    sqlx::query("UPDATE families SET settings_json = ?, updated_at = ? WHERE id = ?")
        .bind(serde_json::to_string(&family.settings)?)
        .bind(time::to_db_string(&time::now()))
        .bind(family_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(family.settings)
}

/// Delete a family and its role records; only the creator may do this
pub async fn delete_family(pool: &SqlitePool, family_id: &str, requester: &UserId) -> Result<()> {
    let mut tx = begin_write(pool).await?;
    let family = fetch_family_tx(&mut tx, family_id).await?;

    if family.created_by != requester.as_str() {
        return Err(Error::Forbidden(
            "Only the family creator can delete the family".to_string(),
        ));
    }

    sqlx::query("DELETE FROM family_member_roles WHERE family_id = ?")
        .bind(family_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM families WHERE id = ?")
        .bind(family_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(family_id = %family_id, requester = %requester, "Deleted family");
    Ok(())
}

/// Active role records of a family, in join order
pub async fn member_roles(pool: &SqlitePool, family_id: &str) -> Result<Vec<FamilyMemberRole>> {
    let rows = sqlx::query(
        r#"
        SELECT family_id, user_id, role, joined_at, is_active
        FROM family_member_roles
        WHERE family_id = ? AND is_active = 1
        ORDER BY joined_at ASC, rowid ASC
        "#,
    )
    .bind(family_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(role_from_row).collect()
}

/// False when the family does not exist
pub async fn is_member(pool: &SqlitePool, family_id: &str, user_id: &str) -> Result<bool> {
    Ok(get_family(pool, family_id)
        .await?
        .map(|f| f.is_member(user_id))
        .unwrap_or(false))
}

pub async fn role_of(pool: &SqlitePool, family_id: &str, user_id: &str) -> Result<Option<FamilyRole>> {
    let role: Option<String> = sqlx::query_scalar(
        "SELECT role FROM family_member_roles WHERE family_id = ? AND user_id = ?",
    )
    .bind(family_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    role.map(|r| r.parse()).transpose()
}
