use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::OptionalExtension;

use crate::db::SqlitePool;
use crate::models::{NewNote, NewSession, NewUser, Session, TranslationNote, User};
use crate::repos::Repo;
use crate::schema::{sessions, translation_notes, users};

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    pub fn new(pool: SqlitePool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl Repo for SqliteRepo {
    async fn create_user(&self, new_user: NewUser<'_>) -> anyhow::Result<User> {
        let pool = self.pool.clone();
        let new_user = (
            new_user.id.to_string(),
            new_user.email.to_string(),
            new_user.password_hash.map(|s| s.to_string()),
            new_user.created_at.to_string(),
            new_user.updated_at.to_string(),
        );
        let user = tokio::task::spawn_blocking(move || -> anyhow::Result<User> {
            let mut conn = pool.get()?;
            diesel::insert_into(users::table)
                .values(&NewUser {
                    id: &new_user.0,
                    email: &new_user.1,
                    password_hash: new_user.2.as_deref(),
                    created_at: &new_user.3,
                    updated_at: &new_user.4,
                })
                .execute(&mut conn)?;
            let u = users::table.find(&new_user.0).first::<User>(&mut conn)?;
            Ok(u)
        })
        .await??;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let email = email.to_string();
        let pool = self.pool.clone();
        let user = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<User>> {
            let mut conn = pool.get()?;
            let u = users::table
                .filter(users::email.eq(&email))
                .first::<User>(&mut conn)
                .optional()?;
            Ok(u)
        })
        .await??;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
        let id = id.to_string();
        let pool = self.pool.clone();
        let user = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<User>> {
            let mut conn = pool.get()?;
            let u = users::table.find(&id).first::<User>(&mut conn).optional()?;
            Ok(u)
        })
        .await??;
        Ok(user)
    }

    async fn create_session(&self, new_session: NewSession<'_>) -> anyhow::Result<Session> {
        let pool = self.pool.clone();
        let new_session = (
            new_session.id.to_string(),
            new_session.user_id.to_string(),
            new_session.token.to_string(),
            new_session.expires_at.to_string(),
            new_session.created_at.to_string(),
            new_session.ip_address.map(|s| s.to_string()),
            new_session.user_agent.map(|s| s.to_string()),
        );
        let session = tokio::task::spawn_blocking(move || -> anyhow::Result<Session> {
            let mut conn = pool.get()?;
            diesel::insert_into(sessions::table)
                .values(&NewSession {
                    id: &new_session.0,
                    user_id: &new_session.1,
                    token: &new_session.2,
                    expires_at: &new_session.3,
                    created_at: &new_session.4,
                    ip_address: new_session.5.as_deref(),
                    user_agent: new_session.6.as_deref(),
                })
                .execute(&mut conn)?;
            let s = sessions::table.find(&new_session.0).first::<Session>(&mut conn)?;
            Ok(s)
        })
        .await??;
        Ok(session)
    }

    async fn find_session_by_token(&self, token: &str) -> anyhow::Result<Option<Session>> {
        let token = token.to_string();
        let pool = self.pool.clone();
        let session = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<Session>> {
            let mut conn = pool.get()?;
            let s = sessions::table
                .filter(sessions::token.eq(&token))
                .first::<Session>(&mut conn)
                .optional()?;
            Ok(s)
        })
        .await??;
        Ok(session)
    }

    async fn delete_session_by_token(&self, token: &str) -> anyhow::Result<usize> {
        let token = token.to_string();
        let pool = self.pool.clone();
        let n = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
            let mut conn = pool.get()?;
            let n = diesel::delete(sessions::table.filter(sessions::token.eq(&token)))
                .execute(&mut conn)?;
            Ok(n)
        })
        .await??;
        Ok(n)
    }

    async fn delete_sessions_for_user(&self, user_id: &str) -> anyhow::Result<usize> {
        let user_id = user_id.to_string();
        let pool = self.pool.clone();
        let n = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
            let mut conn = pool.get()?;
            let n = diesel::delete(sessions::table.filter(sessions::user_id.eq(&user_id)))
                .execute(&mut conn)?;
            Ok(n)
        })
        .await??;
        Ok(n)
    }

    async fn delete_expired_sessions(&self, cutoff: &str) -> anyhow::Result<usize> {
        let cutoff = cutoff.to_string();
        let pool = self.pool.clone();
        let n = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
            let mut conn = pool.get()?;
            let n = diesel::delete(sessions::table.filter(sessions::expires_at.lt(&cutoff)))
                .execute(&mut conn)?;
            Ok(n)
        })
        .await??;
        Ok(n)
    }

    async fn list_notes(&self, user_id: &str) -> anyhow::Result<Vec<TranslationNote>> {
        let user_id = user_id.to_string();
        let pool = self.pool.clone();
        let notes = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<TranslationNote>> {
            let mut conn = pool.get()?;
            let rows = translation_notes::table
                .filter(translation_notes::user_id.eq(&user_id))
                .order(translation_notes::created_at.desc())
                .load::<TranslationNote>(&mut conn)?;
            Ok(rows)
        })
        .await??;
        Ok(notes)
    }

    async fn create_note(&self, new_note: NewNote<'_>) -> anyhow::Result<TranslationNote> {
        let pool = self.pool.clone();
        let new_note = (
            new_note.id.to_string(),
            new_note.user_id.to_string(),
            new_note.source_text.to_string(),
            new_note.translated_text.to_string(),
            new_note.source_lang.to_string(),
            new_note.target_lang.to_string(),
            new_note.created_at.to_string(),
        );
        let note = tokio::task::spawn_blocking(move || -> anyhow::Result<TranslationNote> {
            let mut conn = pool.get()?;
            diesel::insert_into(translation_notes::table)
                .values(&NewNote {
                    id: &new_note.0,
                    user_id: &new_note.1,
                    source_text: &new_note.2,
                    translated_text: &new_note.3,
                    source_lang: &new_note.4,
                    target_lang: &new_note.5,
                    created_at: &new_note.6,
                })
                .execute(&mut conn)?;
            let n = translation_notes::table
                .find(&new_note.0)
                .first::<TranslationNote>(&mut conn)?;
            Ok(n)
        })
        .await??;
        Ok(note)
    }

    async fn delete_note(&self, id: &str, user_id: &str) -> anyhow::Result<usize> {
        let id = id.to_string();
        let user_id = user_id.to_string();
        let pool = self.pool.clone();
        let n = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
            let mut conn = pool.get()?;
            let n = diesel::delete(
                translation_notes::table
                    .filter(translation_notes::id.eq(&id))
                    .filter(translation_notes::user_id.eq(&user_id)),
            )
            .execute(&mut conn)?;
            Ok(n)
        })
        .await??;
        Ok(n)
    }
}
