use actix_web::{App, HttpServer, middleware, web};

use semillero::offline::{self, JsonOfflineStore, OfflineConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = OfflineConfig::from_env();
    let store = JsonOfflineStore::new(&config.store_path);
    log::info!("Offline store at {}", store.path().display());
    log::info!("Starting offline server at http://{}", config.bind_addr);

    let store = web::Data::new(store);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(store.clone())
            .app_data(web::PayloadConfig::new(8 * 1024 * 1024))
            .configure(offline::handlers::configure)
            .service(actix_files::Files::new("/static", "./static"))
            .route(
                "/",
                web::get().to(|| async {
                    actix_web::HttpResponse::Ok()
                        .content_type("text/html; charset=utf-8")
                        .body(include_str!("../../static/offline/index.html"))
                }),
            )
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
