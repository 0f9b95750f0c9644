#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use spartan_api::auth::jwt::JwtConfig;
use spartan_api::auth::password::hash_password;
use spartan_api::config::{MediaConfig, ServerConfig};
use spartan_api::middleware::rate_limit::RateLimiter;
use spartan_api::router::build_app_router;
use spartan_api::state::AppState;
use spartan_cloud::MemoryStorage;
use spartan_core::media::MediaPipeline;
use spartan_db::models::invite_code::CreateInviteCode;
use spartan_db::models::user::{CreateUser, User};
use spartan_db::repositories::{InviteCodeRepo, UserRepo};

pub const TEST_BUCKET: &str = "test-bucket";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

const MULTIPART_BOUNDARY: &str = "spartan-test-boundary";

/// Build a test `ServerConfig` with safe defaults. Rate limiting is off
/// unless a test opts in.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        max_upload_mb: 10,
        rate_limit_per_minute: 0,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            expiration_mins: 60,
        },
        media: MediaConfig {
            scratch_dir: std::env::temp_dir(),
            tool_timeout: Duration::from_secs(10),
        },
    }
}

/// Full application router over an in-memory object store.
pub struct TestApp {
    pub router: Router,
    pub storage: Arc<MemoryStorage>,
}

impl TestApp {
    /// A fresh handle to the router for one `oneshot` call.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// Goes through [`build_app_router`] so integration tests exercise the same
/// middleware stack (CORS, request ID, timeout, tracing, panic recovery,
/// rate limiting) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    spawn_test_app(pool, test_config()).router
}

/// Like [`build_test_app`] but keeps a handle to the object store.
pub fn build_test_app_with_storage(pool: PgPool) -> TestApp {
    spawn_test_app(pool, test_config())
}

/// An app that admits `limit` requests per client per minute.
pub fn build_rate_limited_app(pool: PgPool, limit: u32) -> Router {
    let mut config = test_config();
    config.rate_limit_per_minute = limit;
    spawn_test_app(pool, config).router
}

fn spawn_test_app(pool: PgPool, config: ServerConfig) -> TestApp {
    let storage = Arc::new(MemoryStorage::new(TEST_BUCKET));
    let media = Arc::new(MediaPipeline::new(
        config.media.scratch_dir.clone(),
        config.media.tool_timeout,
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        storage: storage.clone(),
        media,
        rate_limiter: Arc::new(RateLimiter::per_minute(config.rate_limit_per_minute)),
    };

    TestApp {
        router: build_app_router(state, &config),
        storage,
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Insert a user directly, with [`TEST_PASSWORD`] as password.
pub async fn seed_user(pool: &PgPool, username: &str, is_admin: bool) -> User {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        name: None,
        phone_number: None,
        is_admin,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Insert an unexpiring invite code and return the code.
pub async fn seed_invite(pool: &PgPool, created_by: &User) -> String {
    let invite = InviteCodeRepo::create(
        pool,
        &CreateInviteCode {
            code: spartan_core::invite::generate_invite_code(),
            created_by: created_by.id,
            expires_at: None,
        },
    )
    .await
    .expect("invite creation should succeed");
    invite.code
}

/// Log in through the API and return the bearer token.
pub async fn login(app: Router, username: &str) -> String {
    let response = post_json(
        app,
        "/api/auth/login",
        serde_json::json!({ "username": username, "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), 200, "login as {username} should succeed");
    let json = body_json(response).await;
    json["token"]
        .as_str()
        .expect("login response must carry a token")
        .to_string()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router is infallible")
}

fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, json_request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, json_request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, None, Some(body))).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(token), Some(body))).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(token), None)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, Some(token), Some(body))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, json_request(Method::DELETE, uri, Some(token), None)).await
}

/// One part of a multipart form.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

/// POST a `multipart/form-data` body.
pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    parts: &[Part<'_>],
    token: &str,
) -> Response<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{filename}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("valid request");
    send(app, request).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// A small PNG for upload tests.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("PNG encoding should succeed");
    buf
}
