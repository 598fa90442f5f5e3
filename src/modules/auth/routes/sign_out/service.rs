use super::types::response;
use crate::{
    modules::auth::{
        authentication::{Scheme, CSRF_COOKIE, SESSION_COOKIE},
        middleware::Auth,
        service,
    },
    types::Context,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, auth: Auth, jar: CookieJar) -> response::Response {
    if auth.scheme == Scheme::Session {
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            service::end_session(&ctx, cookie.value())
                .await
                .map_err(|_| response::Error::FailedToSignOut)?;
            tracing::info!("Closed session for user {}", auth.user.id);
        }
    }

    Ok(response::Success::SignedOut(
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
            .remove(Cookie::build(CSRF_COOKIE).path("/")),
    ))
}
