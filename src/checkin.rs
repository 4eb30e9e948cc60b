//! Server side of the member check-in flow.
//!
//! The browser decodes the QR code and posts the raw payload; `Scanner`
//! turns it into at most one attendance insert per session and meeting.
//! The storage layer enforces the same rule with a UNIQUE constraint, so a
//! lost session flag cannot produce a second record.

use sqlx::SqlitePool;
use std::fmt;

use crate::errors::AppError;
use crate::models::attendance::{self, AttendanceRecord, NewAttendance};
use crate::models::meeting::{self, Meeting};
use crate::models::profile::Profile;
use crate::qr::{self, PayloadError};

/// Where check-ins are read from and written to.
#[allow(async_fn_in_trait)]
pub trait AttendanceStore {
    async fn find_meeting(&self, id: i64) -> Result<Option<Meeting>, AppError>;

    /// `Ok(None)` when the record already exists or the meeting closed.
    async fn insert_attendance(
        &self,
        new: &NewAttendance,
    ) -> Result<Option<AttendanceRecord>, AppError>;
}

impl AttendanceStore for SqlitePool {
    async fn find_meeting(&self, id: i64) -> Result<Option<Meeting>, AppError> {
        meeting::find_by_id(self, id).await
    }

    async fn insert_attendance(
        &self,
        new: &NewAttendance,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        attendance::insert(self, new).await
    }
}

#[derive(Debug)]
pub enum ScanOutcome {
    /// A new record was written.
    Registered(AttendanceRecord),
    /// This scanner already succeeded; nothing was sent to the store.
    AlreadyScanned,
    /// The store already held a record for this member.
    AlreadyRecorded,
}

#[derive(Debug)]
pub enum ScanError {
    /// Payload is not a meeting id. The client keeps scanning.
    Decode(PayloadError),
    UnknownMeeting(i64),
    MeetingClosed(i64),
    Store(AppError),
}

impl ScanError {
    /// True when the client should keep its camera running and retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScanError::Decode(_) | ScanError::Store(_))
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ScanError::Decode(_) => "Código no reconocido, sigue escaneando",
            ScanError::UnknownMeeting(_) => "El código no corresponde a ninguna reunión",
            ScanError::MeetingClosed(_) => "La reunión ya fue cerrada",
            ScanError::Store(_) => "No se pudo registrar la asistencia",
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Decode(e) => write!(f, "decode failed: {e}"),
            ScanError::UnknownMeeting(id) => write!(f, "meeting {id} does not exist"),
            ScanError::MeetingClosed(id) => write!(f, "meeting {id} is closed"),
            ScanError::Store(e) => write!(f, "store failed: {e}"),
        }
    }
}

impl From<AppError> for ScanError {
    fn from(e: AppError) -> Self {
        ScanError::Store(e)
    }
}

/// One-shot check-in state for a member.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Scanner {
    scanned: bool,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the flag persisted from an earlier request.
    pub fn resume(scanned: bool) -> Self {
        Self { scanned }
    }

    pub fn has_scanned(&self) -> bool {
        self.scanned
    }

    /// Handle one decoded payload.
    ///
    /// The flag is only set once the store confirms a record exists; any
    /// error leaves it unset so the member can retry.
    pub async fn on_decode<S: AttendanceStore>(
        &mut self,
        store: &S,
        member: &Profile,
        payload: &str,
    ) -> Result<ScanOutcome, ScanError> {
        if self.scanned {
            return Ok(ScanOutcome::AlreadyScanned);
        }

        let meeting_id = qr::decode_payload(payload).map_err(ScanError::Decode)?;
        let meeting = store
            .find_meeting(meeting_id)
            .await?
            .ok_or(ScanError::UnknownMeeting(meeting_id))?;
        if !meeting.active {
            return Err(ScanError::MeetingClosed(meeting_id));
        }

        let new = NewAttendance {
            meeting_id,
            user_id: member.id,
            full_name: member.full_name.clone(),
            username: member.username.clone(),
            avatar_url: member.avatar_url.clone(),
        };

        match store.insert_attendance(&new).await? {
            Some(record) => {
                self.scanned = true;
                Ok(ScanOutcome::Registered(record))
            }
            None => {
                // Either a duplicate or the meeting closed between the two calls.
                match store.find_meeting(meeting_id).await? {
                    Some(m) if m.active => {
                        self.scanned = true;
                        Ok(ScanOutcome::AlreadyRecorded)
                    }
                    _ => Err(ScanError::MeetingClosed(meeting_id)),
                }
            }
        }
    }
}
