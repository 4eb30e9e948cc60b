//! Profile tests: settings updates, avatar URL and role changes.

mod common;

use semillero::errors::{AppError, is_unique_violation};
use semillero::models::profile::{self, ProfileUpdate, Role};
use common::*;

#[tokio::test]
async fn test_update_profile_fields() {
    let (_dir, pool) = setup_test_db().await;
    let ana = create_member(&pool, "ana", "Ana").await;

    let update = ProfileUpdate {
        full_name: "Ana María Gómez".to_string(),
        username: "anamaria".to_string(),
        phone: Some("300 123 4567".to_string()),
    };
    profile::update(&pool, ana.id, &update).await.expect("Failed to update");

    let reloaded = profile::find_by_id(&pool, ana.id).await.expect("query").expect("profile");
    assert_eq!(reloaded.full_name, "Ana María Gómez");
    assert_eq!(reloaded.username, "anamaria");
    assert_eq!(reloaded.phone_digits(), "3001234567");
}

#[tokio::test]
async fn test_update_missing_profile_is_not_found() {
    let (_dir, pool) = setup_test_db().await;
    let update = ProfileUpdate {
        full_name: "Nadie".to_string(),
        username: "nadie".to_string(),
        phone: None,
    };
    let err = profile::update(&pool, 999, &update).await.expect_err("should fail");
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn test_username_collision_is_unique_violation() {
    let (_dir, pool) = setup_test_db().await;
    create_member(&pool, "ana", "Ana").await;
    let luis = create_member(&pool, "luis", "Luis").await;

    let update = ProfileUpdate {
        full_name: "Luis".to_string(),
        username: "ana".to_string(),
        phone: None,
    };
    let err = profile::update(&pool, luis.id, &update).await.expect_err("should collide");
    assert!(is_unique_violation(&err));
}

#[tokio::test]
async fn test_avatar_url_set_and_cleared() {
    let (_dir, pool) = setup_test_db().await;
    let ana = create_member(&pool, "ana", "Ana").await;

    profile::set_avatar_url(&pool, ana.id, Some("/avatars/1.png?v=1")).await.expect("set");
    let p = profile::find_by_id(&pool, ana.id).await.expect("query").expect("profile");
    assert_eq!(p.avatar_url.as_deref(), Some("/avatars/1.png?v=1"));

    profile::set_avatar_url(&pool, ana.id, None).await.expect("clear");
    let p = profile::find_by_id(&pool, ana.id).await.expect("query").expect("profile");
    assert!(p.avatar_url.is_none());
}

#[tokio::test]
async fn test_role_change_and_admin_count() {
    let (_dir, pool) = setup_test_db().await;
    create_admin(&pool, "root").await;
    let ana = create_member(&pool, "ana", "Ana").await;
    assert_eq!(profile::count_admins(&pool).await.expect("count"), 1);

    profile::set_role(&pool, ana.id, Role::Admin).await.expect("promote");
    assert_eq!(profile::count_admins(&pool).await.expect("count"), 2);

    let all = profile::find_all(&pool).await.expect("list");
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|p| p.is_admin()));
}
