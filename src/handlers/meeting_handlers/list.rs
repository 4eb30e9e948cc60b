use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::auth::session::{current_profile, require_admin};
use crate::config::AppConfig;
use crate::errors::{AppError, render};
use crate::models::attendance;
use crate::models::meeting::{self, HistoryQuery};
use crate::qr;
use crate::templates_structs::{
    MeetingDetailTemplate, MeetingsAdminTemplate, MeetingsMemberTemplate, PageContext,
};

/// Values the create form is re-rendered with after a validation error.
#[derive(Default)]
pub struct AdminFormState {
    pub errors: Vec<String>,
    pub name: String,
    pub leader: String,
}

/// GET /meetings
///
/// Admins get the manager, members get the scanner.
pub async fn index(
    pool: web::Data<SqlitePool>,
    session: Session,
    config: web::Data<AppConfig>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let caller = current_profile(&session)?;
    if caller.is_admin() {
        admin_view(&pool, &session, &config, query.date.as_deref(), AdminFormState::default()).await
    } else {
        member_view(&pool, &session, &config, caller.id).await
    }
}

pub async fn admin_view(
    pool: &SqlitePool,
    session: &Session,
    config: &AppConfig,
    date: Option<&str>,
    mut form: AdminFormState,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(session, pool, &config.app_name, "/meetings").await?;

    let active = meeting::find_active(pool).await?;
    let (qr_svg, attendees) = match &active {
        Some(m) => {
            let svg = match qr::meeting_svg(m.id) {
                Ok(svg) => Some(svg),
                Err(e) => {
                    log::error!("QR render failed for meeting {}: {e}", m.id);
                    None
                }
            };
            (svg, attendance::find_by_meeting(pool, m.id).await?)
        }
        None => (None, vec![]),
    };

    let mut history = meeting::find_history(pool).await?;
    let date_filter = date.map(str::trim).unwrap_or("").to_string();
    if !date_filter.is_empty() {
        match NaiveDate::parse_from_str(&date_filter, "%Y-%m-%d") {
            Ok(day) => history = meeting::filter_by_date(history, day),
            Err(_) => form.errors.push("La fecha del filtro no es válida".to_string()),
        }
    }

    let tmpl = MeetingsAdminTemplate {
        ctx,
        active,
        qr_svg,
        attendees,
        history,
        date_filter,
        errors: form.errors,
        form_name: form.name,
        form_leader: form.leader,
    };
    render(tmpl)
}

async fn member_view(
    pool: &SqlitePool,
    session: &Session,
    config: &AppConfig,
    user_id: i64,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(session, pool, &config.app_name, "/meetings").await?;
    let active = meeting::find_active(pool).await?;
    let checked_in = match &active {
        Some(m) => attendance::find_for_member(pool, m.id, user_id).await?,
        None => None,
    };
    render(MeetingsMemberTemplate { ctx, active, checked_in })
}

/// GET /meetings/{id}
///
/// Attendee list of any meeting.
pub async fn detail(
    pool: web::Data<SqlitePool>,
    session: Session,
    config: web::Data<AppConfig>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let id = path.into_inner();
    let ctx = PageContext::build(&session, &pool, &config.app_name, "/meetings").await?;

    let meeting = meeting::find_by_id(&pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let attendees = attendance::find_by_meeting(&pool, id).await?;

    render(MeetingDetailTemplate { ctx, meeting, attendees })
}
