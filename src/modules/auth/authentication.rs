use async_trait::async_trait;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use headers::{
    authorization::{Basic, Bearer},
    Authorization, HeaderMapExt,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    modules::user::repository::User,
    types::Context,
    utils::{password, token},
};

pub const SESSION_COOKIE: &str = "sessionid";
pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "x-csrftoken";

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    Session,
    Basic,
    Bearer,
}

#[derive(Debug)]
pub enum Error {
    AuthenticationFailed,
    CsrfFailed,
    UnexpectedError,
}

/// One way of turning request credentials into a user.
///
/// `Ok(None)` means the scheme did not apply and the next scheme should be
/// tried. `Err` stops the chain.
#[async_trait]
pub trait Authenticator: Send + Sync {
    fn scheme(&self) -> Scheme;

    async fn authenticate(&self, ctx: &Context, parts: &Parts) -> Result<Option<User>, Error>;
}

fn active(user: Option<User>) -> Option<User> {
    user.filter(|user| user.is_active)
}

async fn find_user(ctx: &Context, user_id: &str) -> Result<Option<User>, Error> {
    ctx.db
        .find_user_by_id(user_id)
        .await
        .map(active)
        .map_err(|_| Error::UnexpectedError)
}

/// Cookie session. Unsafe methods must echo the session's CSRF token.
pub struct SessionAuthentication;

#[async_trait]
impl Authenticator for SessionAuthentication {
    fn scheme(&self) -> Scheme {
        Scheme::Session
    }

    async fn authenticate(&self, ctx: &Context, parts: &Parts) -> Result<Option<User>, Error> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(None);
        };

        let session = ctx
            .db
            .find_session(&token::digest(cookie.value()), Utc::now())
            .await
            .map_err(|_| Error::UnexpectedError)?;
        let Some(session) = session else {
            tracing::debug!("Ignoring unknown or expired session cookie");
            return Ok(None);
        };

        let Some(user) = find_user(ctx, &session.user_id).await? else {
            return Ok(None);
        };

        if !parts.method.is_safe() {
            let header = parts
                .headers
                .get(CSRF_HEADER)
                .and_then(|value| value.to_str().ok());

            if header != Some(session.csrf_token.as_str()) {
                tracing::warn!("CSRF check failed for user {}", user.id);
                return Err(Error::CsrfFailed);
            }
        }

        Ok(Some(user))
    }
}

/// HTTP Basic with the user's password. Credentials that do not check out
/// fail the request instead of falling back to anonymous access.
pub struct BasicAuthentication;

#[async_trait]
impl Authenticator for BasicAuthentication {
    fn scheme(&self) -> Scheme {
        Scheme::Basic
    }

    async fn authenticate(&self, ctx: &Context, parts: &Parts) -> Result<Option<User>, Error> {
        let Some(Authorization(basic)) = parts.headers.typed_get::<Authorization<Basic>>() else {
            return Ok(None);
        };

        let user = ctx
            .db
            .find_user_by_username(basic.username())
            .await
            .map_err(|_| Error::UnexpectedError)?;

        match active(user) {
            Some(user) if password::verify(basic.password(), &user.password_hash) => Ok(Some(user)),
            _ => {
                tracing::warn!("Invalid basic credentials for {}", basic.username());
                Err(Error::AuthenticationFailed)
            }
        }
    }
}

/// OAuth2 bearer token issued by the provider.
pub struct BearerAuthentication;

#[async_trait]
impl Authenticator for BearerAuthentication {
    fn scheme(&self) -> Scheme {
        Scheme::Bearer
    }

    async fn authenticate(&self, ctx: &Context, parts: &Parts) -> Result<Option<User>, Error> {
        let Some(Authorization(bearer)) = parts.headers.typed_get::<Authorization<Bearer>>() else {
            return Ok(None);
        };

        let access_token = ctx
            .db
            .find_access_token(&token::digest(bearer.token()), Utc::now())
            .await
            .map_err(|_| Error::UnexpectedError)?;

        match access_token {
            Some(access_token) => find_user(ctx, &access_token.user_id).await,
            None => {
                tracing::debug!("Ignoring unknown or expired bearer token");
                Ok(None)
            }
        }
    }
}

/// Ordered scheme list; the first scheme yielding a user wins.
#[derive(Clone)]
pub struct Authenticators(Vec<Arc<dyn Authenticator>>);

impl Default for Authenticators {
    fn default() -> Self {
        Self(vec![
            Arc::new(SessionAuthentication),
            Arc::new(BasicAuthentication),
            Arc::new(BearerAuthentication),
        ])
    }
}

impl Authenticators {
    pub fn new(authenticators: Vec<Arc<dyn Authenticator>>) -> Self {
        Self(authenticators)
    }

    pub async fn authenticate(
        &self,
        ctx: &Context,
        parts: &Parts,
    ) -> Result<Option<(User, Scheme)>, Error> {
        for authenticator in &self.0 {
            if let Some(user) = authenticator.authenticate(ctx, parts).await? {
                return Ok(Some((user, authenticator.scheme())));
            }
        }

        Ok(None)
    }
}
