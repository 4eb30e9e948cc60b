use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use crate::auth::password;
use crate::errors::AppError;
use crate::models::profile::{self, NewProfile, Role};

pub type DbPool = SqlitePool;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub async fn init_pool(database_url: &str) -> Result<DbPool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    MIGRATOR.run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Create the initial admin account when no admin exists yet.
pub async fn seed_admin(pool: &DbPool, email: &str, plain_password: &str) -> Result<(), AppError> {
    let (admins,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE role = 'admin'")
        .fetch_one(pool)
        .await?;
    if admins > 0 {
        log::info!("Admin account present ({admins}), skipping seed");
        return Ok(());
    }

    let hash = password::hash_password(plain_password).map_err(AppError::Hash)?;
    let new = NewProfile {
        email: email.to_string(),
        password: hash,
        full_name: "Administrador".to_string(),
        username: "admin".to_string(),
        role: Role::Admin,
    };
    let id = profile::create(pool, &new).await?;
    log::info!("Seeded admin account '{email}' (profile {id})");
    Ok(())
}
