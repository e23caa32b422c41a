use crate::error::Error;
use crate::models::{now_utc, NewUser, PublicUser, User};
use crate::repos::Repo;
use crate::security;

/// Email/password registration. The unique index on `users.email` is the
/// conflict authority; a duplicate insert surfaces as `Error::Conflict`.
pub async fn create_user(repo: &dyn Repo, email: &str, password: &str) -> Result<PublicUser, Error> {
    let hash = security::hash_password(password)?;
    let id = uuid::Uuid::new_v4().to_string();
    let now = now_utc();
    let new_user = NewUser {
        id: &id,
        email,
        password_hash: Some(&hash),
        created_at: &now,
        updated_at: &now,
    };
    match repo.create_user(new_user).await {
        Ok(user) => Ok(user.into()),
        Err(e) if is_unique_violation(&e) => {
            Err(Error::Conflict("Email already registered".into()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Uniform lookup: unknown email, a passwordless (OAuth-only) account and a
/// wrong password are indistinguishable to the caller.
pub async fn verify_credentials(
    repo: &dyn Repo,
    email: &str,
    password: &str,
) -> Result<Option<User>, Error> {
    let Some(user) = repo.find_user_by_email(email).await? else {
        return Ok(None);
    };
    let Some(hash) = user.password_hash.as_deref() else {
        return Ok(None);
    };
    if security::verify_password(hash, password) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// First OAuth sign-in provisions a local account with no password
/// credential.
pub async fn get_or_create_user_by_email(repo: &dyn Repo, email: &str) -> Result<User, Error> {
    if let Some(user) = repo.find_user_by_email(email).await? {
        return Ok(user);
    }
    let id = uuid::Uuid::new_v4().to_string();
    let now = now_utc();
    let new_user =
        NewUser { id: &id, email, password_hash: None, created_at: &now, updated_at: &now };
    match repo.create_user(new_user).await {
        Ok(user) => Ok(user),
        // Lost a race with a concurrent first sign-in for the same address.
        Err(e) if is_unique_violation(&e) => repo
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| Error::Internal(anyhow::anyhow!("user missing after email conflict"))),
        Err(e) => Err(e.into()),
    }
}

fn is_unique_violation(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<diesel::result::Error>(),
        Some(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        ))
    )
}
