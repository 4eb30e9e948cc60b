use sqlx::SqlitePool;

use crate::errors::AppError;
use super::types::*;

const PROFILE_SELECT: &str = "\
SELECT p.id, u.email, p.full_name, p.username, p.role, p.avatar_url, p.phone \
FROM profiles p \
JOIN users u ON u.id = p.id";

/// Create the credentials row and its profile in one transaction. Returns the profile id.
pub async fn create(pool: &SqlitePool, new: &NewProfile) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    let id = sqlx::query("INSERT INTO users (email, password, created_at) VALUES (?, ?, ?)")
        .bind(new.email.trim().to_lowercase())
        .bind(&new.password)
        .bind(chrono::Utc::now())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    sqlx::query(
        "INSERT INTO profiles (id, full_name, username, role) VALUES (?, ?, ?, ?)",
    )
    .bind(id)
    .bind(new.full_name.trim())
    .bind(new.username.trim())
    .bind(new.role)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(id)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Profile>, AppError> {
    let sql = format!("{PROFILE_SELECT} WHERE p.id = ?");
    let profile = sqlx::query_as::<_, Profile>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(profile)
}

/// Look up login credentials by email (case-insensitive).
pub async fn find_credentials_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<Credentials>, AppError> {
    let row = sqlx::query_as::<_, Credentials>(
        "SELECT u.id, u.password FROM users u JOIN profiles p ON p.id = u.id WHERE u.email = ?",
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn email_taken(pool: &SqlitePool, email: &str) -> Result<bool, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email.trim().to_lowercase())
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// True when another profile already uses the username.
pub async fn username_taken(
    pool: &SqlitePool,
    username: &str,
    except_id: Option<i64>,
) -> Result<bool, AppError> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM profiles WHERE username = ? AND id != COALESCE(?, -1)",
    )
    .bind(username.trim())
    .bind(except_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// All profiles for the members page, alphabetical by name.
pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Profile>, AppError> {
    let sql = format!("{PROFILE_SELECT} ORDER BY p.full_name COLLATE NOCASE ASC, p.id ASC");
    let profiles = sqlx::query_as::<_, Profile>(&sql).fetch_all(pool).await?;
    Ok(profiles)
}

pub async fn update(pool: &SqlitePool, id: i64, update: &ProfileUpdate) -> Result<(), AppError> {
    let phone = update
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());
    let result = sqlx::query(
        "UPDATE profiles SET full_name = ?, username = ?, phone = ? WHERE id = ?",
    )
    .bind(update.full_name.trim())
    .bind(update.username.trim())
    .bind(phone)
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn set_avatar_url(pool: &SqlitePool, id: i64, url: Option<&str>) -> Result<(), AppError> {
    sqlx::query("UPDATE profiles SET avatar_url = ? WHERE id = ?")
        .bind(url)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_role(pool: &SqlitePool, id: i64, role: Role) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE profiles SET role = ? WHERE id = ?")
        .bind(role)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn count_admins(pool: &SqlitePool) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE role = 'admin'")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
