use super::service::service;
use super::types::request;
use crate::{types::Context, utils::validation::Payload};
use axum::{extract::State, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

pub async fn handler(
    State(ctx): State<Arc<Context>>,
    jar: CookieJar,
    Payload(payload): Payload<request::Payload>,
) -> impl IntoResponse {
    service(ctx, jar, payload).await
}
