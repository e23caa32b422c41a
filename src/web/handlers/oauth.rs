use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect};
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::app::AppState;
use crate::auth::oauth;
use crate::error::Error;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub async fn google_start(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Redirect, Error> {
    oauth::start(&state, &cookies).await
}

pub async fn google_callback(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    oauth::callback(&state, &cookies, &headers, query).await
}
