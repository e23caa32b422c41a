use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tower_cookies::Cookies;

use crate::app::AppState;
use crate::error::Error;
use crate::models::{now_utc, NewNote};
use crate::web::session as web_session;

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub source_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
}

pub async fn list(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<impl IntoResponse, Error> {
    let (_, user) = web_session::require_user(&state, &cookies).await?;
    let notes = state.repo.list_notes(&user.id).await?;
    Ok(Json(json!({ "notes": notes })))
}

pub async fn create(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(body): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, Error> {
    let (_, user) = web_session::require_user(&state, &cookies).await?;
    if body.source_text.is_empty()
        || body.translated_text.is_empty()
        || body.source_lang.is_empty()
        || body.target_lang.is_empty()
    {
        return Err(Error::Validation("all note fields are required".into()));
    }
    let id = uuid::Uuid::new_v4().to_string();
    let created_at = now_utc();
    let note = state
        .repo
        .create_note(NewNote {
            id: &id,
            user_id: &user.id,
            source_text: &body.source_text,
            translated_text: &body.translated_text,
            source_lang: &body.source_lang,
            target_lang: &body.target_lang,
            created_at: &created_at,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Owner-scoped delete: a row belonging to someone else is indistinguishable
/// from a missing one.
pub async fn remove(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let (_, user) = web_session::require_user(&state, &cookies).await?;
    let deleted = state.repo.delete_note(&id, &user.id).await?;
    if deleted == 0 {
        return Err(Error::NotFound("note not found".into()));
    }
    Ok(Json(json!({ "success": true })))
}
