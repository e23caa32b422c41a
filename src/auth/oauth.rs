use axum::http::HeaderMap;
use axum::response::Redirect;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::app::AppState;
use crate::auth::{password, session};
use crate::config::GoogleCfg;
use crate::error::Error;
use crate::web::handlers::oauth::CallbackQuery;
use crate::web::session as web_session;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Begins the PKCE authorization-code flow. State and verifier go into two
/// short-lived private cookies the callback consumes exactly once.
pub async fn start(state: &AppState, cookies: &Cookies) -> Result<Redirect, Error> {
    let google = state
        .config
        .google
        .as_ref()
        .ok_or_else(|| Error::Config("Google OAuth is not configured".into()))?;
    let client = oauth_client(google)?;

    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let (auth_url, csrf_token) = client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .set_pkce_challenge(pkce_challenge)
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .url();

    web_session::write_oauth_state(
        cookies,
        &state.cookie_key,
        csrf_token.secret(),
        pkce_verifier.secret(),
        state.config.server.secure_cookies,
    );
    Ok(Redirect::temporary(auth_url.as_str()))
}

/// Finishes the flow. The ephemeral cookies are read and removed up front so
/// every exit path, including failures past this point, leaves the browser
/// clean. Failures log server-side and redirect with a generic indicator;
/// provider detail never reaches the client.
pub async fn callback(
    state: &AppState,
    cookies: &Cookies,
    headers: &HeaderMap,
    query: CallbackQuery,
) -> Redirect {
    let stored = web_session::take_oauth_state(cookies, &state.cookie_key);
    match complete(state, cookies, headers, query, stored).await {
        Ok(redirect) => redirect,
        Err(failure) => {
            tracing::error!(
                error = ?failure.detail,
                indicator = %failure.indicator,
                "google oauth callback failed"
            );
            redirect_with(&[("auth_error", &failure.indicator)])
        }
    }
}

struct CallbackFailure {
    indicator: String,
    detail: anyhow::Error,
}

fn fail(indicator: &str, detail: anyhow::Error) -> CallbackFailure {
    CallbackFailure { indicator: indicator.to_string(), detail }
}

async fn complete(
    state: &AppState,
    cookies: &Cookies,
    headers: &HeaderMap,
    query: CallbackQuery,
    stored: Option<web_session::OAuthTransaction>,
) -> Result<Redirect, CallbackFailure> {
    if let Some(err) = query.error {
        let detail = anyhow::anyhow!("provider reported error: {err}");
        return Err(CallbackFailure { indicator: err, detail });
    }
    let (Some(code), Some(state_param)) = (query.code, query.state) else {
        return Err(fail("missing_code", anyhow::anyhow!("callback missing code or state")));
    };
    let Some(stored) = stored else {
        return Err(fail(
            "missing_oauth_session",
            anyhow::anyhow!("state/verifier cookies absent or expired"),
        ));
    };
    // Anti-CSRF: checked before any token exchange is attempted.
    if stored.state != state_param {
        return Err(fail(
            "state_mismatch",
            anyhow::anyhow!("state parameter does not match stored value"),
        ));
    }

    let google = state
        .config
        .google
        .as_ref()
        .ok_or_else(|| fail("google_auth_failed", anyhow::anyhow!("Google OAuth is not configured")))?;
    let client =
        oauth_client(google).map_err(|e| fail("google_auth_failed", anyhow::anyhow!(e)))?;

    let token_response = client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(PkceCodeVerifier::new(stored.verifier))
        .request_async(async_http_client)
        .await
        .map_err(|e| fail("google_auth_failed", anyhow::anyhow!("token exchange: {e}")))?;

    let profile = fetch_userinfo(token_response.access_token().secret())
        .await
        .map_err(|e| fail("google_auth_failed", e))?;
    let Some(email) = profile.email else {
        return Err(fail("google_auth_failed", anyhow::anyhow!("google profile missing email")));
    };

    let user = password::get_or_create_user_by_email(state.repo.as_ref(), &email)
        .await
        .map_err(|e| fail("google_auth_failed", anyhow::anyhow!(e)))?;

    let (ip_address, user_agent) = web_session::client_meta(headers);
    let session = session::create(
        state.repo.as_ref(),
        &user.id,
        ip_address.as_deref(),
        user_agent.as_deref(),
    )
    .await
    .map_err(|e| fail("google_auth_failed", anyhow::anyhow!(e)))?;

    web_session::set_session_cookie(cookies, &session, state.config.server.secure_cookies);
    Ok(redirect_with(&[("auth", "google")]))
}

fn oauth_client(cfg: &GoogleCfg) -> Result<BasicClient, Error> {
    let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
        .map_err(|e| Error::Internal(anyhow::anyhow!("auth url: {e}")))?;
    let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
        .map_err(|e| Error::Internal(anyhow::anyhow!("token url: {e}")))?;
    let redirect_url = RedirectUrl::new(cfg.redirect_uri.clone())
        .map_err(|e| Error::Config(format!("invalid GOOGLE_REDIRECT_URI: {e}")))?;
    Ok(BasicClient::new(
        ClientId::new(cfg.client_id.clone()),
        Some(ClientSecret::new(cfg.client_secret.clone())),
        auth_url,
        Some(token_url),
    )
    .set_redirect_uri(redirect_url))
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    email: Option<String>,
}

async fn fetch_userinfo(access_token: &str) -> anyhow::Result<UserInfo> {
    let response = reqwest::Client::new()
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("userinfo request failed: {status} {body}");
    }
    Ok(response.json().await?)
}

/// Redirect to the application root with percent-encoded query indicators.
fn redirect_with(params: &[(&str, &str)]) -> Redirect {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        query.append_pair(key, value);
    }
    Redirect::temporary(&format!("/?{}", query.finish()))
}
