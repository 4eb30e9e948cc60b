use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::auth::session::{get_user_id, refresh, set_flash};
use crate::auth::{csrf, validate};
use crate::config::AppConfig;
use crate::errors::{AppError, is_unique_violation, render};
use crate::models::profile::{self, ProfileUpdate};
use crate::storage::{AvatarStore, MAX_AVATAR_BYTES};
use crate::templates_structs::{PageContext, ProfileTemplate};

#[derive(Deserialize)]
pub struct ProfileForm {
    pub action: String, // "update_profile", "upload_avatar", "delete_avatar"
    pub csrf_token: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub avatar_data_uri: String,
}

async fn render_form(
    pool: &SqlitePool,
    session: &Session,
    config: &AppConfig,
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(session, pool, &config.app_name, "/profile").await?;
    let profile = profile::find_by_id(pool, ctx.user_id)
        .await?
        .ok_or_else(|| AppError::Session("Profile no longer exists".to_string()))?;
    render(ProfileTemplate {
        ctx,
        profile,
        errors,
        max_avatar_kb: MAX_AVATAR_BYTES / 1024,
    })
}

/// GET /profile
pub async fn form(
    pool: web::Data<SqlitePool>,
    session: Session,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    render_form(&pool, &session, &config, vec![]).await
}

/// POST /profile
///
/// One form, dispatched on `action`.
pub async fn submit(
    pool: web::Data<SqlitePool>,
    session: Session,
    config: web::Data<AppConfig>,
    avatars: web::Data<AvatarStore>,
    form: web::Form<ProfileForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let user_id = get_user_id(&session)
        .ok_or_else(|| AppError::Session("User not logged in".to_string()))?;

    match form.action.as_str() {
        "update_profile" => {
            let mut errors: Vec<String> = vec![];
            errors.extend(validate::validate_required(&form.full_name, "El nombre", 120));
            errors.extend(validate::validate_username(&form.username));
            errors.extend(validate::validate_phone(&form.phone));
            if errors.is_empty()
                && profile::username_taken(&pool, &form.username, Some(user_id)).await?
            {
                errors.push("Ese nombre de usuario ya está en uso".to_string());
            }
            if !errors.is_empty() {
                return render_form(&pool, &session, &config, errors).await;
            }

            let update = ProfileUpdate {
                full_name: form.full_name.trim().to_string(),
                username: form.username.trim().to_string(),
                phone: Some(form.phone.trim().to_string()).filter(|p| !p.is_empty()),
            };
            match profile::update(&pool, user_id, &update).await {
                Ok(()) => {}
                Err(e) if is_unique_violation(&e) => {
                    let errors = vec!["Ese nombre de usuario ya está en uso".to_string()];
                    return render_form(&pool, &session, &config, errors).await;
                }
                Err(e) => return Err(e),
            }
            set_flash(&session, "Perfil actualizado");
        }
        "upload_avatar" => {
            let url = match avatars.save(user_id, &form.avatar_data_uri) {
                Ok(url) => url,
                Err(AppError::BadRequest(msg)) => {
                    return render_form(&pool, &session, &config, vec![msg]).await;
                }
                Err(e) => return Err(e),
            };
            profile::set_avatar_url(&pool, user_id, Some(&url)).await?;
            set_flash(&session, "Foto de perfil actualizada");
        }
        "delete_avatar" => {
            avatars.remove(user_id)?;
            profile::set_avatar_url(&pool, user_id, None).await?;
            set_flash(&session, "Foto de perfil eliminada");
        }
        other => {
            return Err(AppError::BadRequest(format!("Unknown action '{other}'")));
        }
    }

    if let Some(updated) = profile::find_by_id(&pool, user_id).await? {
        refresh(&session, &updated);
    }

    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/profile"))
        .finish())
}
