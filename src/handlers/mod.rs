pub mod auth_handlers;
pub mod home_handlers;
pub mod meeting_handlers;
pub mod member_handlers;
pub mod profile_handlers;

use actix_web::{HttpResponse, web};

use crate::auth;

/// Public routes plus the authenticated scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Public routes
        .route("/login", web::get().to(auth_handlers::login_page))
        .route("/login", web::post().to(auth_handlers::login_submit))
        .route("/register", web::get().to(auth_handlers::register_page))
        .route("/register", web::post().to(auth_handlers::register_submit))
        // Protected routes
        .service(
            web::scope("")
                .wrap(actix_web::middleware::from_fn(auth::middleware::require_auth))
                .route("/", web::get().to(home_handlers::index))
                .route("/logout", web::post().to(auth_handlers::logout))
                .route("/members", web::get().to(member_handlers::list))
                .route("/members/{id}/role", web::post().to(member_handlers::change_role))
                .route("/profile", web::get().to(profile_handlers::form))
                .route("/profile", web::post().to(profile_handlers::submit))
                .route("/checkin", web::post().to(meeting_handlers::checkin))
                .route("/meetings", web::get().to(meeting_handlers::index))
                .route("/meetings", web::post().to(meeting_handlers::create))
                .route("/meetings/{id}", web::get().to(meeting_handlers::detail))
                .route("/meetings/{id}/close", web::post().to(meeting_handlers::close))
                .route("/meetings/{id}/export.csv", web::get().to(meeting_handlers::export_csv))
                .route("/meetings/{id}/feed", web::get().to(meeting_handlers::ws_feed))
                .default_service(web::to(not_found)),
        );
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(include_str!("../../templates/errors/404.html"))
}
