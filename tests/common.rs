#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use phrasebook::app::{build_router, AppState};
use phrasebook::config::{AppConfig, DbCfg, ServerCfg, TranslateCfg};
use phrasebook::db::{self, SqlitePool};
use phrasebook::repos::sqlite::SqliteRepo;
use phrasebook::repos::Repo;
use phrasebook::translate::Translator;
use phrasebook::web::session::SESSION_COOKIE;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot
use tower_cookies::Key;

/// Fixed key so tests can mint private cookies the app will accept.
pub const TEST_COOKIE_KEY: [u8; 64] = [7u8; 64];

pub struct TestApp {
    pub _dir: TempDir,
    pub pool: SqlitePool,
    pub repo: Arc<dyn Repo>,
    pub router: Router,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerCfg {
            bind_addr: "127.0.0.1:0".into(),
            public_url: "http://127.0.0.1:0".into(),
            cookie_key_base64: String::new(),
            secure_cookies: false,
        },
        db: DbCfg { url: String::new() },
        google: None,
        translate: TranslateCfg::default(),
    }
}

pub fn spawn_app() -> anyhow::Result<TestApp> {
    spawn_app_with(test_config())
}

pub fn spawn_app_with(mut config: AppConfig) -> anyhow::Result<TestApp> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("test.sqlite").display().to_string();
    config.db = DbCfg { url: db_path.clone() };

    // Small pool to reduce SQLite locking contention
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool: Pool<ConnectionManager<SqliteConnection>> =
        Pool::builder().max_size(2).build(manager)?;

    // Run embedded migrations
    {
        let mut conn = pool.get()?;
        db::run_migrations(&mut conn)?;
    }

    let repo: Arc<dyn Repo> = SqliteRepo::new(pool.clone());
    let state = AppState {
        config: config.clone(),
        cookie_key: Key::from(&TEST_COOKIE_KEY),
        repo: repo.clone(),
        translator: Translator::new(config.translate.clone()),
    };
    Ok(TestApp { _dir: dir, pool, repo, router: build_router(state) })
}

pub fn post_json(uri: &str, body: &serde_json::Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("build request")
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("build request")
}

pub fn delete_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::delete(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("build request")
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(res.into_body(), 1024 * 1024).await.expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// The `name=value` pair of the session cookie from a Set-Cookie header.
pub fn session_cookie_from(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{SESSION_COOKIE}=")))
        .and_then(|v| v.split(';').next())
        .map(|v| v.to_string())
}

pub fn set_cookies_from(res: &Response<Body>) -> Vec<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .collect()
}

pub fn token_from_cookie(cookie: &str) -> &str {
    cookie.strip_prefix(&format!("{SESSION_COOKIE}=")).unwrap_or(cookie)
}

pub async fn register_and_login(
    router: &Router,
    email: &str,
    password: &str,
) -> (serde_json::Value, String) {
    let res = router
        .clone()
        .oneshot(post_json(
            "/api/auth/register",
            &json!({ "email": email, "password": password }),
            None,
        ))
        .await
        .expect("register request");
    assert_eq!(res.status(), StatusCode::CREATED);
    let registered = body_json(res).await;

    let res = router
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            &json!({ "email": email, "password": password }),
            None,
        ))
        .await
        .expect("login request");
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie_from(&res).expect("session cookie");
    (registered, cookie)
}
