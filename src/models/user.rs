use diesel::prelude::*;
use serde::Serialize;

/// Full row, including the credential column. OAuth-provisioned accounts
/// carry no password hash at all rather than a fake secret.
#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Wire shape for user records; the password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self { id: u.id, email: u.email, created_at: u.created_at, updated_at: u.updated_at }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}
