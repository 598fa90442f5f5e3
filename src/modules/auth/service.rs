use chrono::Utc;

use super::repository::Session;
use crate::{
    modules::user::repository::{CreateUserPayload, User},
    types::{AdminConfig, Context},
    utils::{password, token},
};

pub enum Error {
    UnexpectedError,
}

type Result<T> = std::result::Result<T, Error>;

/// A session together with the clear-text key that goes into the cookie.
pub struct IssuedSession {
    pub key: String,
    pub session: Session,
}

pub async fn create_session(ctx: &Context, user: &User) -> Result<IssuedSession> {
    let key = token::generate();
    let now = Utc::now();

    let session = ctx
        .db
        .create_session(Session {
            key_digest: token::digest(&key),
            user_id: user.id.clone(),
            csrf_token: token::generate(),
            expires_at: now + ctx.auth.session_ttl,
            created_at: now,
        })
        .await
        .map_err(|_| Error::UnexpectedError)?;

    tracing::info!("Opened session for user {}", user.id);

    Ok(IssuedSession { key, session })
}

pub async fn end_session(ctx: &Context, key: &str) -> Result<()> {
    ctx.db
        .delete_session(&token::digest(key))
        .await
        .map_err(|_| Error::UnexpectedError)
}

/// Makes sure the configured administrator exists. An existing account is left as is.
pub async fn ensure_admin(ctx: &Context, admin: &AdminConfig) -> Result<User> {
    let existing = ctx
        .db
        .find_user_by_username(&admin.username)
        .await
        .map_err(|_| Error::UnexpectedError)?;

    if let Some(user) = existing {
        if !user.is_admin {
            tracing::warn!(
                "Configured admin {} exists but is not an administrator",
                admin.username
            );
        }
        return Ok(user);
    }

    let password_hash = password::hash(&admin.password).map_err(|_| Error::UnexpectedError)?;

    let user = ctx
        .db
        .create_user(CreateUserPayload {
            username: admin.username.clone(),
            password_hash,
            is_admin: true,
        })
        .await
        .map_err(|_| Error::UnexpectedError)?;

    tracing::info!("Created administrator {}", user.username);

    Ok(user)
}
