use actix_session::Session;
use actix_web::{HttpResponse, web};
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::errors::{AppError, render};
use crate::models::profile;
use crate::templates_structs::{HomeTemplate, PageContext};

/// GET /
///
/// Welcome card for the signed-in profile.
pub async fn index(
    pool: web::Data<SqlitePool>,
    session: Session,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &pool, &config.app_name, "/").await?;
    let profile = profile::find_by_id(&pool, ctx.user_id)
        .await?
        .ok_or_else(|| AppError::Session("Profile no longer exists".to_string()))?;
    render(HomeTemplate { ctx, profile })
}
