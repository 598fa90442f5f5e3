use super::service;
use super::types::request;
use crate::{modules::auth::middleware::Principal, types::Context, utils::validation::Payload};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub async fn get(
    principal: Principal,
    State(ctx): State<Arc<Context>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    service::list_grants(ctx, principal, id).await
}

pub async fn put(
    principal: Principal,
    State(ctx): State<Arc<Context>>,
    Path(id): Path<String>,
    payload: Result<Payload<request::Payload>, Response>,
) -> impl IntoResponse {
    service::replace_grants(ctx, principal, id, payload.map(|Payload(payload)| payload)).await
}
