use actix_web::{HttpResponse, http::header, web};
use uuid::Uuid;

use super::errors::OfflineError;
use super::export::{self, CsvKind};
use super::store::JsonOfflineStore;
use super::types::{NewMember, NewSession, SetAttendance};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/state", web::get().to(state))
            .route("/members", web::post().to(add_member))
            .route("/members/{id}", web::delete().to(remove_member))
            .route("/sessions", web::post().to(add_session))
            .route("/sessions/{id}", web::delete().to(remove_session))
            .route("/asistencias", web::put().to(set_attendance))
            .route("/export.json", web::get().to(export_json))
            .route("/export/{kind}.csv", web::get().to(export_csv))
            .route("/import", web::post().to(import_json)),
    );
}

/// Run a store call on the blocking pool; every call touches the file system.
async fn blocking<T, F>(store: &web::Data<JsonOfflineStore>, f: F) -> Result<T, OfflineError>
where
    F: FnOnce(&JsonOfflineStore) -> Result<T, OfflineError> + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    web::block(move || f(&store)).await?
}

pub async fn state(store: web::Data<JsonOfflineStore>) -> Result<HttpResponse, OfflineError> {
    let document = blocking(&store, |s| s.load()).await?;
    Ok(HttpResponse::Ok().json(document))
}

pub async fn add_member(
    store: web::Data<JsonOfflineStore>,
    body: web::Json<NewMember>,
) -> Result<HttpResponse, OfflineError> {
    let input = body.into_inner();
    let member = blocking(&store, move |s| s.add_member(input)).await?;
    Ok(HttpResponse::Created().json(member))
}

pub async fn remove_member(
    store: web::Data<JsonOfflineStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, OfflineError> {
    let id = path.into_inner();
    blocking(&store, move |s| s.remove_member(id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn add_session(
    store: web::Data<JsonOfflineStore>,
    body: web::Json<NewSession>,
) -> Result<HttpResponse, OfflineError> {
    let input = body.into_inner();
    let session = blocking(&store, move |s| s.add_session(input)).await?;
    Ok(HttpResponse::Created().json(session))
}

pub async fn remove_session(
    store: web::Data<JsonOfflineStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, OfflineError> {
    let id = path.into_inner();
    blocking(&store, move |s| s.remove_session(id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn set_attendance(
    store: web::Data<JsonOfflineStore>,
    body: web::Json<SetAttendance>,
) -> Result<HttpResponse, OfflineError> {
    let input = body.into_inner();
    let entry = blocking(&store, move |s| s.set_attendance(input)).await?;
    Ok(HttpResponse::Ok().json(entry))
}

pub async fn export_json(store: web::Data<JsonOfflineStore>) -> Result<HttpResponse, OfflineError> {
    let body = blocking(&store, |s| s.export_json()).await?;
    let file_name = format!("semillero-{}.json", chrono::Local::now().format("%Y%m%d"));
    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .insert_header(attachment(&file_name))
        .body(body))
}

pub async fn export_csv(
    store: web::Data<JsonOfflineStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, OfflineError> {
    let kind: CsvKind = path.parse()?;
    let body = blocking(&store, move |s| export::to_csv(&s.load()?, kind)).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(attachment(kind.file_name()))
        .body(body))
}

/// Body is the raw JSON backup, so a malformed file reaches the validator
/// instead of being rejected by the extractor.
pub async fn import_json(
    store: web::Data<JsonOfflineStore>,
    body: String,
) -> Result<HttpResponse, OfflineError> {
    let document = blocking(&store, move |s| s.import_json(&body)).await?;
    Ok(HttpResponse::Ok().json(document))
}

fn attachment(file_name: &str) -> (header::HeaderName, String) {
    (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{file_name}\""),
    )
}
