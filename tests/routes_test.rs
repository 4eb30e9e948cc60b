//! Route-level tests: authentication gate, login, check-in over HTTP,
//! the admin meetings view, role changes and the live feed socket.

mod common;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, HttpServer, test, web};
use futures_util::StreamExt;
use regex::Regex;
use serde_json::Value;
use sqlx::SqlitePool;
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use semillero::auth::rate_limit::RateLimiter;
use semillero::config::AppConfig;
use semillero::feed::FeedHub;
use semillero::handlers;
use semillero::models::profile::{self, Role};
use semillero::models::{attendance, meeting};
use semillero::storage::AvatarStore;

// ============================================================================
// TEST APP
// ============================================================================

/// Shared state for every app instance in one test. The session key and
/// feed hub are shared, so a cookie from the in-process service also opens
/// the socket on the real server, and check-ins reach its feed.
#[derive(Clone)]
struct AppParts {
    pool: SqlitePool,
    key: Key,
    hub: web::Data<FeedHub>,
    config: web::Data<AppConfig>,
    avatars: web::Data<AvatarStore>,
}

async fn test_parts() -> (TempDir, AppParts) {
    let (dir, pool) = common::setup_test_db().await;
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let parts = AppParts {
        pool,
        key: Key::generate(),
        hub: web::Data::new(FeedHub::new()),
        avatars: web::Data::new(AvatarStore::new(config.avatar_dir())),
        config: web::Data::new(config),
    };
    (dir, parts)
}

macro_rules! app {
    ($parts:expr) => {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), $parts.key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(web::Data::new($parts.pool.clone()))
            .app_data($parts.config.clone())
            .app_data($parts.avatars.clone())
            .app_data($parts.hub.clone())
            .app_data(web::Data::new(RateLimiter::default()))
            .configure(handlers::configure)
    };
}

/// Sign in through the login form. Returns the session cookie and the
/// CSRF token stored in that session.
macro_rules! sign_in {
    ($app:expr, $email:expr) => {{
        let resp = test::call_service(&$app, test::TestRequest::get().uri("/login").to_request()).await;
        let cookie = session_cookie(&resp).expect("session cookie");
        let token = csrf_from(&body_string(resp).await);

        let req = test::TestRequest::post()
            .uri("/login")
            .cookie(cookie)
            .set_form([
                ("email", $email),
                ("password", common::TEST_PASSWORD),
                ("csrf_token", token.as_str()),
            ])
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "login failed for {}", $email);
        (session_cookie(&resp).expect("signed-in cookie"), token)
    }};
}

/// POST /checkin as the given session, keeping the cookie current.
macro_rules! check_in {
    ($app:expr, $cookie:ident, $token:expr, $payload:expr) => {{
        let req = test::TestRequest::post()
            .uri("/checkin")
            .cookie($cookie.clone())
            .set_form([("payload", $payload), ("csrf_token", $token.as_str())])
            .to_request();
        let resp = test::call_service(&$app, req).await;
        if let Some(updated) = session_cookie(&resp) {
            $cookie = updated;
        }
        let status = resp.status();
        let body: Value = serde_json::from_str(&body_string(resp).await).expect("checkin json");
        (status, body)
    }};
}

macro_rules! get_page {
    ($app:expr, $cookie:expr, $uri:expr) => {{
        let req = test::TestRequest::get().uri($uri).cookie($cookie.clone()).to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "GET {}", $uri);
        body_string(resp).await
    }};
}

macro_rules! post_form {
    ($app:expr, $cookie:expr, $uri:expr, $form:expr) => {{
        let req = test::TestRequest::post()
            .uri($uri)
            .cookie($cookie.clone())
            .set_form($form)
            .to_request();
        test::call_service(&$app, req).await.status()
    }};
}

fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.into_owned())
}

async fn body_string<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf-8 body")
}

// ============================================================================
// CSRF TOKEN EXTRACTION
// ============================================================================

fn csrf_from(body: &str) -> String {
    let re = Regex::new(r#"name="csrf_token"\s+value="([^"]+)""#)
        .expect("Failed to compile regex");
    re.captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .expect("csrf_token field not found")
}

// ============================================================================
// AUTHENTICATION
// ============================================================================

#[actix_rt::test]
async fn test_protected_pages_redirect_to_login() {
    let (_dir, parts) = test_parts().await;
    let app = test::init_service(app!(parts)).await;

    for path in ["/", "/meetings", "/members", "/profile"] {
        let req = test::TestRequest::get().uri(path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
    }
}

#[actix_rt::test]
async fn test_login_page_renders_form() {
    let (_dir, parts) = test_parts().await;
    let app = test::init_service(app!(parts)).await;

    let req = test::TestRequest::get().uri("/login").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!csrf_from(&body_string(resp).await).is_empty());
}

#[actix_rt::test]
async fn test_login_without_csrf_session_is_rejected() {
    let (_dir, parts) = test_parts().await;
    common::create_member(&parts.pool, "ana", "Ana").await;
    let app = test::init_service(app!(parts)).await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([
            ("email", "ana@example.com"),
            ("password", common::TEST_PASSWORD),
            ("csrf_token", "forged"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_member_signs_in_and_sees_meetings() {
    let (_dir, parts) = test_parts().await;
    common::create_member(&parts.pool, "ana", "Ana Gómez").await;
    let app = test::init_service(app!(parts)).await;

    // Email lookup ignores case.
    let (cookie, _token) = sign_in!(app, "ANA@example.com");

    let body = get_page!(app, cookie, "/meetings");
    assert!(body.contains("Ana Gómez"));

    // Members cannot open the admin-only detail view.
    let m = common::open_meeting(&parts.pool, "Kickoff", "Ana", None).await;
    let req = test::TestRequest::get()
        .uri(&format!("/meetings/{}", m.id))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_wrong_password_rerenders_login() {
    let (_dir, parts) = test_parts().await;
    common::create_member(&parts.pool, "ana", "Ana").await;
    let app = test::init_service(app!(parts)).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/login").to_request()).await;
    let cookie = session_cookie(&resp).expect("session cookie");
    let token = csrf_from(&body_string(resp).await);

    let req = test::TestRequest::post()
        .uri("/login")
        .cookie(cookie)
        .set_form([
            ("email", "ana@example.com"),
            ("password", "wrong-password"),
            ("csrf_token", token.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Correo o contraseña incorrectos"));
}

// ============================================================================
// CHECK-IN AND MEETING LIFECYCLE
// ============================================================================

#[actix_rt::test]
async fn test_checkin_is_one_shot_across_requests() {
    let (_dir, parts) = test_parts().await;
    common::create_admin(&parts.pool, "admin").await;
    common::create_member(&parts.pool, "ana", "Ana").await;
    let app = test::init_service(app!(parts)).await;
    let (admin, admin_token) = sign_in!(app, "admin@example.com");
    let (mut member, member_token) = sign_in!(app, "ana@example.com");

    let status = post_form!(
        app,
        admin,
        "/meetings",
        [("name", "Kickoff"), ("leader", "Ana"), ("csrf_token", admin_token.as_str())]
    );
    assert_eq!(status, StatusCode::SEE_OTHER);
    let kickoff = meeting::find_active(&parts.pool)
        .await
        .expect("query")
        .expect("meeting opened");
    let payload = kickoff.id.to_string();

    // Unreadable payload: keep scanning.
    let (status, body) = check_in!(app, member, member_token, "junk");
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["retry"], true);

    let (status, body) = check_in!(app, member, member_token, payload.as_str());
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "registered");
    assert_eq!(body["record"]["username"], "ana");

    // The flag lives in the session, so later scans never reach the store.
    let (status, body) = check_in!(app, member, member_token, payload.as_str());
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "already");
    let (status, body) = check_in!(app, member, member_token, "junk");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "already");

    let count = attendance::count_by_meeting(&parts.pool, kickoff.id).await.expect("count");
    assert_eq!(count, 1);
}

#[actix_rt::test]
async fn test_admin_view_after_close_offers_create() {
    let (_dir, parts) = test_parts().await;
    common::create_admin(&parts.pool, "admin").await;
    common::create_member(&parts.pool, "ana", "Ana").await;
    let kickoff = common::open_meeting(&parts.pool, "Kickoff", "Ana", None).await;
    let app = test::init_service(app!(parts)).await;
    let (admin, admin_token) = sign_in!(app, "admin@example.com");
    let (mut member, member_token) = sign_in!(app, "ana@example.com");

    let body = get_page!(app, admin, "/meetings");
    assert!(body.contains("Cerrar reunión"));
    assert!(!body.contains("Iniciar reunión"));

    let close_uri = format!("/meetings/{}/close", kickoff.id);
    let status = post_form!(app, admin, close_uri.as_str(), [("csrf_token", admin_token.as_str())]);
    assert_eq!(status, StatusCode::SEE_OTHER);

    let body = get_page!(app, admin, "/meetings");
    assert!(body.contains("Iniciar reunión"));
    assert!(!body.contains("Cerrar reunión"));

    // Closed meetings reject check-ins without asking for a retry.
    let (status, body) = check_in!(app, member, member_token, kickoff.id.to_string().as_str());
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["retry"], false);

    let status = post_form!(app, admin, close_uri.as_str(), [("csrf_token", admin_token.as_str())]);
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_admin_cannot_check_in() {
    let (_dir, parts) = test_parts().await;
    common::create_admin(&parts.pool, "admin").await;
    let kickoff = common::open_meeting(&parts.pool, "Kickoff", "Ana", None).await;
    let app = test::init_service(app!(parts)).await;
    let (admin, admin_token) = sign_in!(app, "admin@example.com");

    let status = post_form!(
        app,
        admin,
        "/checkin",
        [("payload", kickoff.id.to_string().as_str()), ("csrf_token", admin_token.as_str())]
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    let count = attendance::count_by_meeting(&parts.pool, kickoff.id).await.expect("count");
    assert_eq!(count, 0);
}

// ============================================================================
// ROLES
// ============================================================================

#[actix_rt::test]
async fn test_last_admin_cannot_be_demoted() {
    let (_dir, parts) = test_parts().await;
    let root = common::create_admin(&parts.pool, "admin").await;
    let ana = common::create_member(&parts.pool, "ana", "Ana").await;
    let app = test::init_service(app!(parts)).await;
    let (admin, token) = sign_in!(app, "admin@example.com");

    let own_uri = format!("/members/{}/role", root.id);
    let status = post_form!(app, admin, own_uri.as_str(), [("role", "member"), ("csrf_token", token.as_str())]);
    assert_eq!(status, StatusCode::SEE_OTHER);
    let still = profile::find_by_id(&parts.pool, root.id).await.expect("query").expect("profile");
    assert_eq!(still.role, Role::Admin);
    assert_eq!(profile::count_admins(&parts.pool).await.expect("count"), 1);

    // With a second admin the first one can step down.
    let ana_uri = format!("/members/{}/role", ana.id);
    let status = post_form!(app, admin, ana_uri.as_str(), [("role", "admin"), ("csrf_token", token.as_str())]);
    assert_eq!(status, StatusCode::SEE_OTHER);
    let status = post_form!(app, admin, own_uri.as_str(), [("role", "member"), ("csrf_token", token.as_str())]);
    assert_eq!(status, StatusCode::SEE_OTHER);

    let demoted = profile::find_by_id(&parts.pool, root.id).await.expect("query").expect("profile");
    assert_eq!(demoted.role, Role::Member);
    assert_eq!(profile::count_admins(&parts.pool).await.expect("count"), 1);
}

// ============================================================================
// LIVE FEED
// ============================================================================

type FeedSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn spawn_server(parts: AppParts) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test port");
    let addr = listener.local_addr().expect("local addr");
    let server = HttpServer::new(move || {
        let parts = parts.clone();
        app!(parts)
    })
    .workers(1)
    .disable_signals()
    .listen(listener)
    .expect("listen")
    .run();
    actix_rt::spawn(server);
    addr
}

async fn connect_feed(addr: SocketAddr, meeting_id: i64, cookie: &Cookie<'_>) -> FeedSocket {
    let mut request = format!("ws://{addr}/meetings/{meeting_id}/feed")
        .into_client_request()
        .expect("ws request");
    let value = HeaderValue::from_str(&format!("{}={}", cookie.name(), cookie.value()))
        .expect("cookie header");
    request.headers_mut().insert("cookie", value);
    let (socket, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("feed handshake");
    socket
}

async fn next_json(socket: &mut FeedSocket) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("feed timed out")
            .expect("feed ended")
            .expect("feed error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("feed json");
        }
    }
}

#[actix_rt::test]
async fn test_feed_streams_snapshot_attendee_and_close() {
    let (_dir, parts) = test_parts().await;
    common::create_admin(&parts.pool, "admin").await;
    common::create_member(&parts.pool, "ana", "Ana").await;
    let kickoff = common::open_meeting(&parts.pool, "Kickoff", "Ana", None).await;
    let app = test::init_service(app!(parts)).await;
    let (admin, admin_token) = sign_in!(app, "admin@example.com");
    let (mut member, member_token) = sign_in!(app, "ana@example.com");

    let addr = spawn_server(parts.clone());
    let mut socket = connect_feed(addr, kickoff.id, &admin).await;

    let snapshot = next_json(&mut socket).await;
    assert_eq!(snapshot["type"], "snapshot");
    assert_eq!(snapshot["attendees"].as_array().map(Vec::len), Some(0));

    let (status, _) = check_in!(app, member, member_token, kickoff.id.to_string().as_str());
    assert_eq!(status, StatusCode::OK);
    let pushed = next_json(&mut socket).await;
    assert_eq!(pushed["type"], "attendee");
    assert_eq!(pushed["attendee"]["username"], "ana");
    assert_eq!(pushed["count"], 1);

    let close_uri = format!("/meetings/{}/close", kickoff.id);
    let status = post_form!(app, admin, close_uri.as_str(), [("csrf_token", admin_token.as_str())]);
    assert_eq!(status, StatusCode::SEE_OTHER);
    let closed = next_json(&mut socket).await;
    assert_eq!(closed["type"], "closed");
}

#[actix_rt::test]
async fn test_feed_for_closed_meeting_reports_closed() {
    let (_dir, parts) = test_parts().await;
    common::create_admin(&parts.pool, "admin").await;
    let kickoff = common::open_meeting(&parts.pool, "Kickoff", "Ana", None).await;
    meeting::close(&parts.pool, kickoff.id).await.expect("close");
    let app = test::init_service(app!(parts)).await;
    let (admin, _token) = sign_in!(app, "admin@example.com");

    let addr = spawn_server(parts.clone());
    let mut socket = connect_feed(addr, kickoff.id, &admin).await;

    assert_eq!(next_json(&mut socket).await["type"], "snapshot");
    assert_eq!(next_json(&mut socket).await["type"], "closed");
}
