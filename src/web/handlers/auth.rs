use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tower_cookies::Cookies;

use crate::app::AppState;
use crate::auth::{password, session};
use crate::error::Error;
use crate::models::PublicUser;
use crate::web::session as web_session;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 72;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, Error> {
    validate_credentials(&body)?;
    let user = password::create_user(state.repo.as_ref(), &body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": user.id, "email": user.email }))))
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    Json(body): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, Error> {
    validate_credentials(&body)?;
    let Some(user) =
        password::verify_credentials(state.repo.as_ref(), &body.email, &body.password).await?
    else {
        return Err(Error::Authentication("Invalid credentials".into()));
    };
    let (ip_address, user_agent) = web_session::client_meta(&headers);
    let session = session::create(
        state.repo.as_ref(),
        &user.id,
        ip_address.as_deref(),
        user_agent.as_deref(),
    )
    .await?;
    web_session::set_session_cookie(&cookies, &session, state.config.server.secure_cookies);
    Ok(Json(json!({ "user": PublicUser::from(user) })))
}

/// Always succeeds; an absent or unknown cookie simply has nothing to
/// destroy.
pub async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<impl IntoResponse, Error> {
    if let Some(token) = web_session::session_token(&cookies) {
        session::destroy(state.repo.as_ref(), &token).await?;
    }
    web_session::clear_session_cookie(&cookies);
    Ok(Json(json!({ "success": true })))
}

pub async fn me(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<impl IntoResponse, Error> {
    let Some(token) = web_session::session_token(&cookies) else {
        return Ok((StatusCode::UNAUTHORIZED, Json(json!({ "user": null }))));
    };
    match session::lookup(state.repo.as_ref(), &token).await? {
        Some((_, user)) => Ok((StatusCode::OK, Json(json!({ "user": PublicUser::from(user) })))),
        None => Ok((StatusCode::UNAUTHORIZED, Json(json!({ "user": null })))),
    }
}

fn validate_credentials(body: &CredentialsRequest) -> Result<(), Error> {
    let password_len = body.password.chars().count();
    if !is_plausible_email(&body.email)
        || password_len < PASSWORD_MIN_LEN
        || password_len > PASSWORD_MAX_LEN
    {
        return Err(Error::Validation("Invalid email or password format".into()));
    }
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
