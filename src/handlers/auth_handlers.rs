use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::auth::session::{self, get_user_id, set_flash, take_flash};
use crate::auth::{csrf, password, rate_limit::RateLimiter, validate};
use crate::config::AppConfig;
use crate::errors::{AppError, is_unique_violation, render};
use crate::models::profile::{self, NewProfile, RegisterForm, Role};
use crate::templates_structs::{LoginTemplate, RegisterTemplate};

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location))
        .finish()
}

fn login_template(session: &Session, config: &AppConfig, email: &str, error: Option<String>) -> LoginTemplate {
    LoginTemplate {
        error,
        flash: take_flash(session),
        email: email.to_string(),
        app_name: config.app_name.clone(),
        csrf_token: csrf::get_or_create_token(session),
    }
}

pub async fn login_page(
    session: Session,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    if get_user_id(&session).is_some() {
        return Ok(redirect("/"));
    }
    render(login_template(&session, &config, "", None))
}

pub async fn login_submit(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    session: Session,
    config: web::Data<AppConfig>,
    form: web::Form<LoginForm>,
    limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    // Rate-limit check BEFORE any database access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or_else(|| std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        log::warn!("Login blocked for {ip}: too many failed attempts");
        let tmpl = login_template(
            &session,
            &config,
            &form.email,
            Some("Demasiados intentos fallidos. Intenta de nuevo más tarde.".to_string()),
        );
        return render(tmpl);
    }

    let found = profile::find_credentials_by_email(&pool, &form.email).await?;
    let verified = match &found {
        Some(creds) => matches!(password::verify_password(&form.password, &creds.password), Ok(true)),
        None => false,
    };

    match found {
        Some(creds) if verified => {
            limiter.clear(ip);
            let profile = profile::find_by_id(&pool, creds.id)
                .await?
                .ok_or(AppError::NotFound)?;
            session::sign_in(&session, &profile)?;
            log::info!("Profile {} signed in as {}", profile.id, profile.role);
            Ok(redirect("/"))
        }
        _ => {
            limiter.record_failure(ip);
            let tmpl = login_template(
                &session,
                &config,
                &form.email,
                Some("Correo o contraseña incorrectos".to_string()),
            );
            render(tmpl)
        }
    }
}

pub async fn register_page(
    session: Session,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    if get_user_id(&session).is_some() {
        return Ok(redirect("/"));
    }
    let tmpl = RegisterTemplate {
        errors: vec![],
        full_name: String::new(),
        username: String::new(),
        email: String::new(),
        app_name: config.app_name.clone(),
        csrf_token: csrf::get_or_create_token(&session),
    };
    render(tmpl)
}

pub async fn register_submit(
    pool: web::Data<SqlitePool>,
    session: Session,
    config: web::Data<AppConfig>,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let mut errors: Vec<String> = vec![];
    errors.extend(validate::validate_required(&form.full_name, "El nombre", 120));
    errors.extend(validate::validate_username(&form.username));
    errors.extend(validate::validate_email(&form.email));
    errors.extend(validate::validate_password(&form.password));
    if form.password != form.confirm_password {
        errors.push("Las contraseñas no coinciden".to_string());
    }

    if errors.is_empty() {
        if profile::email_taken(&pool, &form.email).await? {
            errors.push("Ya existe una cuenta con ese correo".to_string());
        }
        if profile::username_taken(&pool, &form.username, None).await? {
            errors.push("Ese nombre de usuario ya está en uso".to_string());
        }
    }

    if errors.is_empty() {
        let hash = password::hash_password(&form.password).map_err(AppError::Hash)?;
        let new = NewProfile {
            email: form.email.trim().to_string(),
            password: hash,
            full_name: form.full_name.trim().to_string(),
            username: form.username.trim().to_string(),
            role: Role::Member,
        };
        match profile::create(&pool, &new).await {
            Ok(id) => {
                log::info!("Registered profile {id} ({})", new.username);
                set_flash(&session, "Cuenta creada. Ya puedes iniciar sesión.");
                return Ok(redirect("/login"));
            }
            // Lost a race with a concurrent registration.
            Err(e) if is_unique_violation(&e) => {
                errors.push("El correo o el usuario ya están registrados".to_string());
            }
            Err(e) => return Err(e),
        }
    }

    let tmpl = RegisterTemplate {
        errors,
        full_name: form.full_name.clone(),
        username: form.username.clone(),
        email: form.email.clone(),
        app_name: config.app_name.clone(),
        csrf_token: csrf::get_or_create_token(&session),
    };
    render(tmpl)
}

pub async fn logout(
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    session.purge();
    Ok(redirect("/login"))
}
