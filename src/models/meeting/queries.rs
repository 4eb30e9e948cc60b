use chrono::Utc;
use sqlx::SqlitePool;

use crate::errors::{AppError, is_unique_violation};
use super::types::*;

const MEETING_COLUMNS: &str =
    "id, name, leader, active, start_time, end_time, created_by, created_at";

/// Open a new meeting (active, started now).
///
/// Fails with `Conflict` when another meeting is still active. The partial
/// unique index on `meetings(active)` backs this check against concurrent
/// admins, so a lost race surfaces as the same `Conflict`.
pub async fn create(
    pool: &SqlitePool,
    new: &NewMeeting,
    created_by: Option<i64>,
) -> Result<Meeting, AppError> {
    if let Some(active) = find_active(pool).await? {
        return Err(AppError::Conflict(format!(
            "La reunión '{}' sigue activa",
            active.name
        )));
    }

    let now = Utc::now();
    let sql = format!(
        "INSERT INTO meetings (name, leader, active, start_time, created_by, created_at) \
         VALUES (?, ?, 1, ?, ?, ?) RETURNING {MEETING_COLUMNS}"
    );
    let result = sqlx::query_as::<_, Meeting>(&sql)
        .bind(new.name.trim())
        .bind(new.leader.trim())
        .bind(now)
        .bind(created_by)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::from);

    match result {
        Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(
            "Ya hay una reunión activa".to_string(),
        )),
        other => other,
    }
}

/// Close an active meeting: inactive, ended now.
/// A missing or already-closed meeting is `NotFound`.
pub async fn close(pool: &SqlitePool, id: i64) -> Result<Meeting, AppError> {
    let sql = format!(
        "UPDATE meetings SET active = 0, end_time = ? \
         WHERE id = ? AND active = 1 RETURNING {MEETING_COLUMNS}"
    );
    sqlx::query_as::<_, Meeting>(&sql)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn find_active(pool: &SqlitePool) -> Result<Option<Meeting>, AppError> {
    let sql = format!(
        "SELECT {MEETING_COLUMNS} FROM meetings WHERE active = 1 ORDER BY start_time DESC LIMIT 1"
    );
    let meeting = sqlx::query_as::<_, Meeting>(&sql)
        .fetch_optional(pool)
        .await?;
    Ok(meeting)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Meeting>, AppError> {
    let sql = format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE id = ?");
    let meeting = sqlx::query_as::<_, Meeting>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(meeting)
}

/// All meetings, newest first.
pub async fn find_history(pool: &SqlitePool) -> Result<Vec<Meeting>, AppError> {
    let sql = format!("SELECT {MEETING_COLUMNS} FROM meetings ORDER BY created_at DESC, id DESC");
    let meetings = sqlx::query_as::<_, Meeting>(&sql).fetch_all(pool).await?;
    Ok(meetings)
}
