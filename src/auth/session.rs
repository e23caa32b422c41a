use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::error::Error;
use crate::models::{format_utc, now_utc, NewSession, Session, User};
use crate::repos::Repo;
use crate::security;

/// Sessions live for a fixed window from issuance; there is no refresh.
pub const SESSION_TTL_DAYS: i64 = 30;

pub async fn create(
    repo: &dyn Repo,
    user_id: &str,
    ip_address: Option<&str>,
    user_agent: Option<&str>,
) -> Result<Session, Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let token = security::generate_session_token();
    let expires_at = format_utc(OffsetDateTime::now_utc() + Duration::days(SESSION_TTL_DAYS));
    let created_at = now_utc();
    let new_session = NewSession {
        id: &id,
        user_id,
        token: &token,
        expires_at: &expires_at,
        created_at: &created_at,
        ip_address,
        user_agent,
    };
    Ok(repo.create_session(new_session).await?)
}

/// The only request-path expiry check. An expired row discovered here is
/// deleted before reporting absence, so unknown and expired tokens are
/// indistinguishable to callers.
pub async fn lookup(repo: &dyn Repo, token: &str) -> Result<Option<(Session, User)>, Error> {
    let Some(session) = repo.find_session_by_token(token).await? else {
        return Ok(None);
    };
    if is_expired(&session) {
        repo.delete_session_by_token(token).await?;
        return Ok(None);
    }
    let Some(user) = repo.find_user_by_id(&session.user_id).await? else {
        return Ok(None);
    };
    Ok(Some((session, user)))
}

fn is_expired(session: &Session) -> bool {
    match OffsetDateTime::parse(&session.expires_at, &Rfc3339) {
        Ok(expires_at) => expires_at <= OffsetDateTime::now_utc(),
        // An unreadable expiry never grants access
        Err(_) => true,
    }
}

/// Idempotent: destroying an unknown token is not an error.
pub async fn destroy(repo: &dyn Repo, token: &str) -> Result<(), Error> {
    repo.delete_session_by_token(token).await?;
    Ok(())
}

/// Mass revocation of every session a user holds.
pub async fn destroy_all_for_user(repo: &dyn Repo, user_id: &str) -> Result<usize, Error> {
    Ok(repo.delete_sessions_for_user(user_id).await?)
}

/// Maintenance sweep; runs on a background interval, never on the request
/// path.
pub async fn clean_expired(repo: &dyn Repo) -> Result<usize, Error> {
    Ok(repo.delete_expired_sessions(&now_utc()).await?)
}
