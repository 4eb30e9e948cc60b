use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::auth::csrf;
use crate::auth::session::{refresh, require_admin, set_flash};
use crate::config::AppConfig;
use crate::errors::{AppError, render};
use crate::models::profile::{self, Role};
use crate::templates_structs::{MembersTemplate, PageContext};

#[derive(Deserialize)]
pub struct RoleForm {
    pub role: String,
    pub csrf_token: String,
}

/// GET /members
///
/// Everyone in the group.
pub async fn list(
    pool: web::Data<SqlitePool>,
    session: Session,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &pool, &config.app_name, "/members").await?;
    let members = profile::find_all(&pool).await?;
    render(MembersTemplate { ctx, members })
}

/// POST /members/{id}/role
///
/// Admin changes a member's role.
pub async fn change_role(
    pool: web::Data<SqlitePool>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<RoleForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let target_id = path.into_inner();
    let role: Role = form.role.parse().map_err(AppError::BadRequest)?;
    let target = profile::find_by_id(&pool, target_id)
        .await?
        .ok_or(AppError::NotFound)?;

    // The group always keeps at least one admin.
    if target.is_admin() && role == Role::Member && profile::count_admins(&pool).await? <= 1 {
        set_flash(&session, "Debe quedar al menos un administrador");
    } else if target.role != role {
        profile::set_role(&pool, target_id, role).await?;
        log::info!(
            "Profile {} changed role of {} to {}",
            admin.id,
            target_id,
            role
        );
        set_flash(
            &session,
            &format!("{} ahora es {}", target.full_name, role.label()),
        );
    }

    // Demoting yourself takes effect on the next request.
    if target_id == admin.id {
        if let Some(updated) = profile::find_by_id(&pool, target_id).await? {
            refresh(&session, &updated);
        }
    }

    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/members"))
        .finish())
}
