use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Proof that a member checked into a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub meeting_id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub scanned_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn scanned_label(&self) -> String {
        self.scanned_at.with_timezone(&Local).format("%H:%M:%S").to_string()
    }
}

/// Insert payload, denormalized from the member's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub meeting_id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}
