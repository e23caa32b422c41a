use diesel::prelude::*;
use serde::Serialize;

/// One row per login. The token column is the bearer credential handed to
/// the browser; a session is valid iff a matching non-expired row exists.
#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::sessions)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: String,
    pub created_at: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub token: &'a str,
    pub expires_at: &'a str,
    pub created_at: &'a str,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}
