use actix_session::Session;
use actix_web::{HttpResponse, http::StatusCode, web};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::auth::csrf;
use crate::auth::session::{current_profile, mark_scanned, scanned_meetings};
use crate::checkin::{ScanError, ScanOutcome, Scanner};
use crate::errors::AppError;
use crate::feed::FeedHub;
use crate::models::attendance::AttendanceRecord;
use crate::models::{meeting, profile};

#[derive(Deserialize)]
pub struct CheckinForm {
    pub payload: String,
    pub csrf_token: String,
}

#[derive(Serialize)]
pub struct CheckinResponse {
    pub status: &'static str,
    pub message: String,
    /// True when the client should keep the camera running.
    pub retry: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<AttendanceRecord>,
}

/// POST /checkin
///
/// The member's browser posts each decoded QR payload here.
pub async fn checkin(
    pool: web::Data<SqlitePool>,
    session: Session,
    hub: web::Data<FeedHub>,
    form: web::Form<CheckinForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let caller = current_profile(&session)?;
    if caller.is_admin() {
        return Err(AppError::PermissionDenied("check-in is for members".to_string()));
    }
    let member = profile::find_by_id(&pool, caller.id)
        .await?
        .ok_or_else(|| AppError::Session("Profile no longer exists".to_string()))?;

    // The one-shot flag belongs to the meeting currently open.
    let active_id = meeting::find_active(&pool).await?.map(|m| m.id);
    let already = active_id.is_some_and(|id| scanned_meetings(&session).contains(&id));
    let mut scanner = Scanner::resume(already);

    let result = scanner.on_decode(pool.get_ref(), &member, &form.payload).await;
    let (status, body) = match result {
        Ok(ScanOutcome::Registered(record)) => {
            mark_scanned(&session, record.meeting_id);
            let watchers = hub.publish(&record);
            log::info!(
                "Profile {} checked into meeting {} ({watchers} live views)",
                member.id,
                record.meeting_id
            );
            (
                StatusCode::OK,
                CheckinResponse {
                    status: "registered",
                    message: "¡Asistencia registrada!".to_string(),
                    retry: false,
                    record: Some(record),
                },
            )
        }
        Ok(ScanOutcome::AlreadyScanned) | Ok(ScanOutcome::AlreadyRecorded) => {
            if let Some(id) = active_id {
                mark_scanned(&session, id);
            }
            (
                StatusCode::OK,
                CheckinResponse {
                    status: "already",
                    message: "Ya registraste tu asistencia en esta reunión".to_string(),
                    retry: false,
                    record: None,
                },
            )
        }
        Err(e) => {
            let status = match &e {
                ScanError::Decode(_) => {
                    log::warn!("Profile {} sent an unreadable payload: {e}", member.id);
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ScanError::UnknownMeeting(_) => StatusCode::NOT_FOUND,
                ScanError::MeetingClosed(_) => StatusCode::CONFLICT,
                ScanError::Store(_) => {
                    log::error!("Check-in failed for profile {}: {e}", member.id);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (
                status,
                CheckinResponse {
                    status: "error",
                    message: e.user_message().to_string(),
                    retry: e.is_retryable(),
                    record: None,
                },
            )
        }
    };

    Ok(HttpResponse::build(status).json(body))
}
