use chrono::Utc;
use sqlx::SqlitePool;

use crate::errors::AppError;
use super::types::*;

const ATTENDANCE_COLUMNS: &str =
    "id, meeting_id, user_id, full_name, username, avatar_url, scanned_at";

/// Record a check-in.
///
/// Returns `Ok(None)` when the row was not written: the member already has a
/// record for this meeting, or the meeting is no longer active.
pub async fn insert(
    pool: &SqlitePool,
    new: &NewAttendance,
) -> Result<Option<AttendanceRecord>, AppError> {
    let sql = format!(
        "INSERT INTO attendees (meeting_id, user_id, full_name, username, avatar_url, scanned_at) \
         SELECT ?, ?, ?, ?, ?, ? \
         WHERE EXISTS (SELECT 1 FROM meetings WHERE id = ? AND active = 1) \
         ON CONFLICT (meeting_id, user_id) DO NOTHING \
         RETURNING {ATTENDANCE_COLUMNS}"
    );
    let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(new.meeting_id)
        .bind(new.user_id)
        .bind(&new.full_name)
        .bind(&new.username)
        .bind(&new.avatar_url)
        .bind(Utc::now())
        .bind(new.meeting_id)
        .fetch_optional(pool)
        .await?;
    Ok(record)
}

/// Attendees of a meeting in scan order.
pub async fn find_by_meeting(
    pool: &SqlitePool,
    meeting_id: i64,
) -> Result<Vec<AttendanceRecord>, AppError> {
    let sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendees WHERE meeting_id = ? \
         ORDER BY scanned_at ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(meeting_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_for_member(
    pool: &SqlitePool,
    meeting_id: i64,
    user_id: i64,
) -> Result<Option<AttendanceRecord>, AppError> {
    let sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendees WHERE meeting_id = ? AND user_id = ?"
    );
    let row = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(meeting_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn count_by_meeting(pool: &SqlitePool, meeting_id: i64) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendees WHERE meeting_id = ?")
        .bind(meeting_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
