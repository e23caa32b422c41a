use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_cookies::{CookieManagerLayer, Key};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::auth;
use crate::config::{decode_cookie_key, AppConfig};
use crate::repos::sqlite::SqliteRepo;
use crate::repos::Repo;
use crate::translate::Translator;
use crate::web::handlers;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub cookie_key: Key,
    pub repo: Arc<dyn Repo>,
    pub translator: Translator,
}

/// Interval for the expired-session sweep. Request-path expiry is enforced
/// by session lookup itself; the sweep only bounds table growth.
const SESSION_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

pub async fn run() -> anyhow::Result<()> {
    // logging
    let _ = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).try_init();

    let config = AppConfig::load()?;
    let key_bytes = decode_cookie_key(&config.server.cookie_key_base64)?;
    let cookie_key = Key::from(&key_bytes);

    let pool = crate::db::make_pool(&config.db.url)?;
    // Run migrations eagerly on startup
    {
        let mut conn = pool.get()?;
        crate::db::run_migrations(&mut conn)?;
    }

    let repo: Arc<dyn Repo> = SqliteRepo::new(pool);
    let translator = Translator::new(config.translate.clone());

    let state = AppState { config: config.clone(), cookie_key, repo: repo.clone(), translator };

    spawn_session_sweeper(repo);

    let app = build_router(state);
    let addr = config.server.bind_addr.clone();
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_session_sweeper(repo: Arc<dyn Repo>) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            tick.tick().await;
            match auth::session::clean_expired(repo.as_ref()).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(removed = n, "swept expired sessions"),
                Err(e) => tracing::warn!(error = ?e, "expired-session sweep failed"),
            }
        }
    });
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/google", get(handlers::oauth::google_start))
        .route("/api/auth/google/callback", get(handlers::oauth::google_callback))
        .route("/api/translate", post(handlers::translate::translate))
        .route("/api/meta", get(handlers::translate::meta))
        .route("/api/notes", get(handlers::notes::list).post(handlers::notes::create))
        .route("/api/notes/{id}", delete(handlers::notes::remove))
        .with_state(state)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
}
