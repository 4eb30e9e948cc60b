use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, middleware, web};

use semillero::auth::rate_limit::RateLimiter;
use semillero::config::AppConfig;
use semillero::feed::FeedHub;
use semillero::storage::AvatarStore;
use semillero::{db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env();
    std::fs::create_dir_all(&config.data_dir)?;

    let pool = db::init_pool(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;
    db::run_migrations(&pool)
        .await
        .map_err(std::io::Error::other)?;
    db::seed_admin(&pool, &config.admin_email, &config.admin_password)
        .await
        .map_err(std::io::Error::other)?;

    let avatars = AvatarStore::new(config.avatar_dir());
    avatars.ensure_dir().map_err(std::io::Error::other)?;

    let secret_key = config.cookie_key();
    let limiter = web::Data::new(RateLimiter::default());
    let hub = web::Data::new(FeedHub::new());
    let bind_addr = config.bind_addr.clone();
    let cookie_secure = config.cookie_secure;
    let config = web::Data::new(config);
    let avatars = web::Data::new(avatars);

    log::info!("Starting server at http://{bind_addr}");

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(config.clone())
            .app_data(limiter.clone())
            .app_data(hub.clone())
            .app_data(avatars.clone())
            // Avatar uploads arrive as data URIs inside a form body.
            .app_data(web::FormConfig::default().limit(1024 * 1024))
            // Static files
            .service(actix_files::Files::new("/static", "./static"))
            .service(actix_files::Files::new("/avatars", avatars.dir()))
            .configure(handlers::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
