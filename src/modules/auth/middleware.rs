use super::authentication::{self, Scheme};
use crate::modules::user::{self, repository::User};
use crate::types::Context;
use crate::utils::response;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::async_trait;
use std::sync::Arc;

/// Whoever is making the request, as settled by the authentication schemes.
#[derive(Clone, Debug)]
pub enum Principal {
    Anonymous,
    User { user: User, scheme: Scheme },
}

impl Principal {
    pub fn user(&self) -> Option<&User> {
        match self {
            Principal::Anonymous => None,
            Principal::User { user, .. } => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(user::repository::is_admin)
    }
}

fn rejection(err: authentication::Error) -> Response {
    match err {
        authentication::Error::AuthenticationFailed => response::authentication_failed(),
        authentication::Error::CsrfFailed => response::error(
            StatusCode::FORBIDDEN,
            response::CSRF_FAILED,
            "CSRF token missing or incorrect",
        )
        .into_response(),
        authentication::Error::UnexpectedError => response::unexpected("Failed to authenticate"),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    Arc<Context>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = Arc::<Context>::from_ref(state);

        match ctx.auth.authenticators.authenticate(&ctx, parts).await {
            Ok(Some((user, scheme))) => Ok(Principal::User { user, scheme }),
            Ok(None) => Ok(Principal::Anonymous),
            Err(err) => Err(rejection(err)),
        }
    }
}

/// Like [`Principal`], but rejects anonymous callers.
#[derive(Clone, Debug)]
pub struct Auth {
    pub user: User,
    pub scheme: Scheme,
}

#[async_trait]
impl<S> FromRequestParts<S> for Auth
where
    Arc<Context>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Principal::from_request_parts(parts, state).await? {
            Principal::User { user, scheme } => Ok(Self { user, scheme }),
            Principal::Anonymous => Err(response::not_authenticated()),
        }
    }
}
