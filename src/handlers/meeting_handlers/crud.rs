use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::auth::session::{require_admin, set_flash};
use crate::auth::{csrf, validate};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::feed::FeedHub;
use crate::models::attendance;
use crate::models::meeting::{self, MeetingForm, NewMeeting};

use super::list::{AdminFormState, admin_view};

const MAX_FIELD_LEN: usize = 120;

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

fn back_to_meetings() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", "/meetings"))
        .finish()
}

/// POST /meetings
///
/// Open a new meeting.
pub async fn create(
    pool: web::Data<SqlitePool>,
    session: Session,
    config: web::Data<AppConfig>,
    form: web::Form<MeetingForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let mut errors: Vec<String> = vec![];
    errors.extend(validate::validate_required(&form.name, "El nombre de la reunión", MAX_FIELD_LEN));
    errors.extend(validate::validate_required(&form.leader, "El líder", MAX_FIELD_LEN));
    if !errors.is_empty() {
        let state = AdminFormState {
            errors,
            name: form.name.clone(),
            leader: form.leader.clone(),
        };
        return admin_view(&pool, &session, &config, None, state).await;
    }

    let new = NewMeeting {
        name: form.name.trim().to_string(),
        leader: form.leader.trim().to_string(),
    };
    match meeting::create(&pool, &new, Some(admin.id)).await {
        Ok(created) => {
            log::info!(
                "Meeting {} '{}' opened by profile {}",
                created.id,
                created.name,
                admin.id
            );
            set_flash(&session, &format!("Reunión '{}' iniciada", created.name));
        }
        Err(AppError::Conflict(msg)) => {
            log::warn!("Profile {} tried to open a second active meeting", admin.id);
            set_flash(&session, &msg);
        }
        Err(e) => return Err(e),
    }
    Ok(back_to_meetings())
}

/// POST /meetings/{id}/close
///
/// End the meeting and notify live views.
pub async fn close(
    pool: web::Data<SqlitePool>,
    session: Session,
    hub: web::Data<FeedHub>,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let id = path.into_inner();
    let closed = meeting::close(&pool, id).await?;
    let notified = hub.close_meeting(id);
    let attendees = attendance::count_by_meeting(&pool, id).await?;
    log::info!(
        "Meeting {} closed by profile {} with {attendees} attendees ({notified} live views notified)",
        closed.id,
        admin.id
    );

    set_flash(&session, &format!("Reunión '{}' finalizada", closed.name));
    Ok(back_to_meetings())
}
