use axum::http::{header, HeaderMap};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies, Key};

use crate::app::AppState;
use crate::auth;
use crate::error::Error;
use crate::models::{Session, User};

pub const SESSION_COOKIE: &str = "pb_session";
pub const OAUTH_STATE_COOKIE: &str = "pb_oauth_state";
pub const OAUTH_VERIFIER_COOKIE: &str = "pb_oauth_verifier";

/// State and verifier ride in private cookies for at most ten minutes.
const OAUTH_COOKIE_TTL: Duration = Duration::minutes(10);

pub fn session_token(cookies: &Cookies) -> Option<String> {
    cookies.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// The cookie expiry mirrors the session row's expiry.
pub fn set_session_cookie(cookies: &Cookies, session: &Session, secure: bool) {
    let mut cookie = Cookie::new(SESSION_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    if let Ok(expires_at) = OffsetDateTime::parse(&session.expires_at, &Rfc3339) {
        cookie.set_expires(expires_at);
    }
    cookies.add(cookie);
}

pub fn clear_session_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookies.remove(cookie);
}

pub struct OAuthTransaction {
    pub state: String,
    pub verifier: String,
}

pub fn write_oauth_state(cookies: &Cookies, key: &Key, state: &str, verifier: &str, secure: bool) {
    let jar = cookies.private(key);
    for (name, value) in [(OAUTH_STATE_COOKIE, state), (OAUTH_VERIFIER_COOKIE, verifier)] {
        let mut cookie = Cookie::new(name, value.to_string());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_secure(secure);
        cookie.set_max_age(OAUTH_COOKIE_TTL);
        jar.add(cookie);
    }
}

/// Read-and-remove. Removal happens even when only one of the pair is
/// present, so a failed callback cannot leave stale artifacts behind.
pub fn take_oauth_state(cookies: &Cookies, key: &Key) -> Option<OAuthTransaction> {
    let jar = cookies.private(key);
    let state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let verifier = jar.get(OAUTH_VERIFIER_COOKIE).map(|c| c.value().to_string());
    for name in [OAUTH_STATE_COOKIE, OAUTH_VERIFIER_COOKIE] {
        let mut cookie = Cookie::new(name, "");
        cookie.set_path("/");
        cookies.remove(cookie);
    }
    Some(OAuthTransaction { state: state?, verifier: verifier? })
}

/// First hop of `x-forwarded-for` plus the user agent, captured at session
/// issuance.
pub fn client_meta(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    (ip_address, user_agent)
}

/// Resolves the session cookie to its (session, user) pair or rejects the
/// request. Expiry enforcement happens inside the lookup.
pub async fn require_user(state: &AppState, cookies: &Cookies) -> Result<(Session, User), Error> {
    let Some(token) = session_token(cookies) else {
        return Err(Error::Authentication("authentication required".into()));
    };
    auth::session::lookup(state.repo.as_ref(), &token)
        .await?
        .ok_or_else(|| Error::Authentication("invalid or expired session".into()))
}
