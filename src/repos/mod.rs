use async_trait::async_trait;

use crate::models::{NewNote, NewSession, NewUser, Session, TranslationNote, User};

/// Storage operations behind a trait object so handlers and services stay
/// independent of the concrete backend.
#[async_trait]
pub trait Repo: Send + Sync {
    async fn create_user(&self, new_user: NewUser<'_>) -> anyhow::Result<User>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_id(&self, id: &str) -> anyhow::Result<Option<User>>;

    async fn create_session(&self, new_session: NewSession<'_>) -> anyhow::Result<Session>;
    async fn find_session_by_token(&self, token: &str) -> anyhow::Result<Option<Session>>;
    async fn delete_session_by_token(&self, token: &str) -> anyhow::Result<usize>;
    async fn delete_sessions_for_user(&self, user_id: &str) -> anyhow::Result<usize>;
    async fn delete_expired_sessions(&self, cutoff: &str) -> anyhow::Result<usize>;

    // Note reads and deletes are scoped by owner in the query itself.
    async fn list_notes(&self, user_id: &str) -> anyhow::Result<Vec<TranslationNote>>;
    async fn create_note(&self, new_note: NewNote<'_>) -> anyhow::Result<TranslationNote>;
    async fn delete_note(&self, id: &str, user_id: &str) -> anyhow::Result<usize>;
}

pub mod sqlite;
