use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";

/// A tracked attendance session.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Meeting {
    pub id: i64,
    pub name: String,
    pub leader: String,
    pub active: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    /// Calendar date of the start time in the server's local timezone.
    pub fn local_date(&self) -> NaiveDate {
        self.start_time.with_timezone(&Local).date_naive()
    }

    pub fn start_label(&self) -> String {
        self.start_time.with_timezone(&Local).format(DISPLAY_FORMAT).to_string()
    }

    pub fn end_label(&self) -> String {
        match self.end_time {
            Some(end) => end.with_timezone(&Local).format(DISPLAY_FORMAT).to_string(),
            None => "—".to_string(),
        }
    }
}

/// Input for opening a meeting.
#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub name: String,
    pub leader: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeetingForm {
    pub name: String,
    pub leader: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub date: Option<String>,
}

/// Keep only meetings whose start falls on `date` (local calendar).
pub fn filter_by_date(meetings: Vec<Meeting>, date: NaiveDate) -> Vec<Meeting> {
    meetings
        .into_iter()
        .filter(|m| m.local_date() == date)
        .collect()
}
