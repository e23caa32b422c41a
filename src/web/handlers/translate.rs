use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tower_cookies::Cookies;

use crate::app::AppState;
use crate::error::Error;
use crate::translate::lang::SUPPORTED_LANGUAGES;
use crate::translate::{Provider, Translation, TRANSLATION_PROVIDERS};
use crate::web::session as web_session;

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub provider: Provider,
}

pub async fn translate(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(body): Json<TranslateRequest>,
) -> Result<Json<Translation>, Error> {
    web_session::require_user(&state, &cookies).await?;
    if body.text.trim().is_empty() {
        return Err(Error::Validation("text must not be empty".into()));
    }
    if body.source_lang.is_empty() || body.target_lang.is_empty() {
        return Err(Error::Validation("language codes must not be empty".into()));
    }
    let translation = state
        .translator
        .translate(&body.text, &body.source_lang, &body.target_lang, body.provider)
        .await?;
    Ok(Json(translation))
}

/// Static catalog the UI renders its pickers from.
pub async fn meta() -> Json<serde_json::Value> {
    let providers: Vec<_> = TRANSLATION_PROVIDERS
        .iter()
        .map(|(id, name, limit)| json!({ "id": id, "name": name, "limit": limit }))
        .collect();
    let languages: Vec<_> = SUPPORTED_LANGUAGES
        .iter()
        .map(|(code, name)| json!({ "code": code, "name": name }))
        .collect();
    Json(json!({ "providers": providers, "languages": languages }))
}
