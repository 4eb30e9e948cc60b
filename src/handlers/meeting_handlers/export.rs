use actix_session::Session;
use actix_web::{HttpResponse, http::header, web};
use sqlx::SqlitePool;

use crate::auth::session::require_admin;
use crate::errors::AppError;
use crate::export;
use crate::models::{attendance, meeting};

/// GET /meetings/{id}/export.csv
///
/// Attendee list as a CSV download.
pub async fn export_csv(
    pool: web::Data<SqlitePool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;

    let id = path.into_inner();
    let meeting = meeting::find_by_id(&pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let records = attendance::find_by_meeting(&pool, id).await?;
    let body = export::attendance_csv(&records)?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export::file_name(&meeting)),
        ))
        .body(body))
}
