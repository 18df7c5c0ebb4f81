//! Family membership operations

use mediarank_common::db::families::{
    add_member, create_family, delete_family, families_for_user, families_for_user_by_role,
    get_family, is_member, member_roles, remove_member, role_of, update_family,
    update_member_role, update_settings,
};
use mediarank_common::db::{init_database, open_in_memory};
use mediarank_common::family::{FamilyRole, FamilySettingsUpdate, PrivacyLevel};
use mediarank_common::models::UserId;
use mediarank_common::Error;
use tempfile::TempDir;

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

#[tokio::test]
async fn test_create_family_makes_creator_parent() {
    let pool = open_in_memory().await.unwrap();
    let family = create_family(&pool, &user("mom"), "The Smiths", Some("  ".to_string()))
        .await
        .unwrap();

    assert_eq!(family.member_ids, vec!["mom".to_string()]);
    assert_eq!(family.created_by, "mom");
    assert!(family.description.is_none());
    assert_eq!(role_of(&pool, &family.id, "mom").await.unwrap(), Some(FamilyRole::Parent));
    assert_eq!(get_family(&pool, &family.id).await.unwrap(), Some(family));
}

#[tokio::test]
async fn test_blank_family_name_rejected() {
    let pool = open_in_memory().await.unwrap();
    let result = create_family(&pool, &user("mom"), "   ", None).await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_add_member_and_conflict() {
    let pool = open_in_memory().await.unwrap();
    let family = create_family(&pool, &user("mom"), "Smiths", None).await.unwrap();

    add_member(&pool, &family.id, "kid", FamilyRole::Child).await.unwrap();
    assert!(is_member(&pool, &family.id, "kid").await.unwrap());

    let again = add_member(&pool, &family.id, "kid", FamilyRole::Sibling).await;
    assert!(matches!(again, Err(Error::Conflict(_))));

    let stored = get_family(&pool, &family.id).await.unwrap().unwrap();
    assert_eq!(stored.member_ids, vec!["mom".to_string(), "kid".to_string()]);

    let roles = member_roles(&pool, &family.id).await.unwrap();
    assert_eq!(roles.len(), 2);
    assert!(roles.iter().all(|r| r.is_active));
}

#[tokio::test]
async fn test_add_member_to_missing_family() {
    let pool = open_in_memory().await.unwrap();
    let result = add_member(&pool, "no-such-family", "kid", FamilyRole::Child).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_remove_member_clears_both_records() {
    let pool = open_in_memory().await.unwrap();
    let family = create_family(&pool, &user("mom"), "Smiths", None).await.unwrap();
    add_member(&pool, &family.id, "kid", FamilyRole::Child).await.unwrap();

    remove_member(&pool, &family.id, "kid").await.unwrap();

    assert!(!is_member(&pool, &family.id, "kid").await.unwrap());
    assert_eq!(role_of(&pool, &family.id, "kid").await.unwrap(), None);

    // Rejoining after removal works
    add_member(&pool, &family.id, "kid", FamilyRole::Other).await.unwrap();
    assert_eq!(role_of(&pool, &family.id, "kid").await.unwrap(), Some(FamilyRole::Other));
}

#[tokio::test]
async fn test_update_member_role() {
    let pool = open_in_memory().await.unwrap();
    let family = create_family(&pool, &user("mom"), "Smiths", None).await.unwrap();
    add_member(&pool, &family.id, "gran", FamilyRole::Other).await.unwrap();

    update_member_role(&pool, &family.id, "gran", FamilyRole::Grandmother)
        .await
        .unwrap();
    assert_eq!(
        role_of(&pool, &family.id, "gran").await.unwrap(),
        Some(FamilyRole::Grandmother)
    );

    let missing = update_member_role(&pool, &family.id, "stranger", FamilyRole::Uncle).await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_families_for_user_and_by_role() {
    let pool = open_in_memory().await.unwrap();
    let first = create_family(&pool, &user("mom"), "Smiths", None).await.unwrap();
    let second = create_family(&pool, &user("dad"), "Joneses", None).await.unwrap();
    add_member(&pool, &second.id, "mom", FamilyRole::Aunt).await.unwrap();

    let mine = families_for_user(&pool, &user("mom")).await.unwrap();
    let ids: Vec<&str> = mine.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);

    let as_parent = families_for_user_by_role(&pool, &user("mom"), FamilyRole::Parent)
        .await
        .unwrap();
    assert_eq!(as_parent.len(), 1);
    assert_eq!(as_parent[0].id, first.id);

    assert!(families_for_user(&pool, &user("nobody")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_family_and_settings() {
    let pool = open_in_memory().await.unwrap();
    let family = create_family(&pool, &user("mom"), "Smiths", Some("Us".to_string()))
        .await
        .unwrap();

    let updated = update_family(&pool, &family.id, Some("The Smiths".to_string()), None)
        .await
        .unwrap();
    assert_eq!(updated.name, "The Smiths");
    assert_eq!(updated.description.as_deref(), Some("Us"));

    let settings = update_settings(
        &pool,
        &family.id,
        FamilySettingsUpdate {
            privacy_level: Some(PrivacyLevel::Public),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(settings.privacy_level, PrivacyLevel::Public);
    assert!(settings.allow_child_rankings);

    let stored = get_family(&pool, &family.id).await.unwrap().unwrap();
    assert_eq!(stored.settings, settings);
}

#[tokio::test]
async fn test_only_creator_can_delete() {
    let pool = open_in_memory().await.unwrap();
    let family = create_family(&pool, &user("mom"), "Smiths", None).await.unwrap();
    add_member(&pool, &family.id, "kid", FamilyRole::Child).await.unwrap();

    let denied = delete_family(&pool, &family.id, &user("kid")).await;
    assert!(matches!(denied, Err(Error::Forbidden(_))));
    assert!(get_family(&pool, &family.id).await.unwrap().is_some());

    delete_family(&pool, &family.id, &user("mom")).await.unwrap();
    assert!(get_family(&pool, &family.id).await.unwrap().is_none());
    assert!(member_roles(&pool, &family.id).await.unwrap().is_empty());

    let gone = delete_family(&pool, &family.id, &user("mom")).await;
    assert!(matches!(gone, Err(Error::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_keep_every_member() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("mediarank.db")).await.unwrap();
    let family = create_family(&pool, &user("mom"), "Smiths", None).await.unwrap();

    let mut handles = Vec::new();
    for n in 0..20 {
        let pool = pool.clone();
        let family_id = family.id.clone();
        handles.push(tokio::spawn(async move {
            add_member(&pool, &family_id, &format!("kid-{}", n), FamilyRole::Child).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("concurrent add_member failed");
    }

    let stored = get_family(&pool, &family.id).await.unwrap().unwrap();
    assert_eq!(stored.member_ids.len(), 21);
    assert_eq!(member_roles(&pool, &family.id).await.unwrap().len(), 21);
}
