use super::types::{request, response};
use crate::{
    modules::auth::{
        authentication::{CSRF_COOKIE, SESSION_COOKIE},
        service,
    },
    types::Context,
    utils::password,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use validator::Validate;

pub async fn service(
    ctx: Arc<Context>,
    jar: CookieJar,
    payload: request::Payload,
) -> response::Response {
    payload.validate().map_err(|errors| {
        tracing::warn!("Failed to validate payload: {errors}");
        response::Error::FailedToValidate(errors)
    })?;

    let user = ctx
        .db
        .find_user_by_username(&payload.username)
        .await
        .map_err(|_| response::Error::FailedToSignIn)?
        .filter(|user| user.is_active)
        .ok_or(response::Error::InvalidCredentials)?;

    if !password::verify(&payload.password, &user.password_hash) {
        tracing::info!("Rejected sign in attempt for {}", payload.username);
        return Err(response::Error::InvalidCredentials);
    }

    let issued = service::create_session(&ctx, &user)
        .await
        .map_err(|_| response::Error::FailedToSignIn)?;

    let session_cookie = Cookie::build((SESSION_COOKIE, issued.key))
        .path("/")
        .http_only(true)
        .secure(ctx.auth.secure_cookies)
        .same_site(SameSite::Lax);
    let csrf_cookie = Cookie::build((CSRF_COOKIE, issued.session.csrf_token.clone()))
        .path("/")
        .secure(ctx.auth.secure_cookies)
        .same_site(SameSite::Lax);

    Ok(response::Success::SignedIn {
        jar: jar.add(session_cookie).add(csrf_cookie),
        user,
        csrf_token: issued.session.csrf_token,
        expires_at: issued.session.expires_at,
    })
}
