//! Shared test infrastructure.
//!
//! # Test Database Setup
//! - `setup_test_db()` - fresh SQLite file in a temp dir with migrations applied
//! - `create_member()` / `create_admin()` - profiles with a known password

#![allow(dead_code)]

use sqlx::SqlitePool;
use tempfile::TempDir;

use semillero::auth::password;
use semillero::db;
use semillero::models::meeting::{self, Meeting, NewMeeting};
use semillero::models::profile::{self, NewProfile, Profile, Role};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const TEST_PASSWORD: &str = "password123";

// ============================================================================
// DATABASE SETUP
// ============================================================================

/// Create a temporary SQLite database and run migrations.
///
/// The returned TempDir must be kept alive for the pool to remain valid.
pub async fn setup_test_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let pool = db::init_pool(&url).await.expect("Failed to open test DB");
    db::run_migrations(&pool).await.expect("Failed to run migrations");
    (dir, pool)
}

// ============================================================================
// FIXTURES
// ============================================================================

pub async fn create_profile(pool: &SqlitePool, username: &str, full_name: &str, role: Role) -> Profile {
    let hash = password::hash_password(TEST_PASSWORD).expect("Failed to hash password");
    let new = NewProfile {
        email: format!("{username}@example.com"),
        password: hash,
        full_name: full_name.to_string(),
        username: username.to_string(),
        role,
    };
    let id = profile::create(pool, &new).await.expect("Failed to create profile");
    profile::find_by_id(pool, id)
        .await
        .expect("Failed to load profile")
        .expect("Profile missing after create")
}

pub async fn create_member(pool: &SqlitePool, username: &str, full_name: &str) -> Profile {
    create_profile(pool, username, full_name, Role::Member).await
}

pub async fn create_admin(pool: &SqlitePool, username: &str) -> Profile {
    create_profile(pool, username, "Admin", Role::Admin).await
}

pub async fn open_meeting(pool: &SqlitePool, name: &str, leader: &str, by: Option<i64>) -> Meeting {
    let new = NewMeeting {
        name: name.to_string(),
        leader: leader.to_string(),
    };
    meeting::create(pool, &new, by).await.expect("Failed to open meeting")
}
