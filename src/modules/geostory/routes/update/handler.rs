use super::service::service;
use super::types::request;
use crate::{
    modules::{
        auth::middleware::Principal,
        geostory::{
            permissions::Action,
            routes::body::{Changes, Document},
        },
    },
    types::Context,
    utils::validation::Payload,
};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub async fn put(
    principal: Principal,
    State(ctx): State<Arc<Context>>,
    Path(id): Path<String>,
    payload: Result<Payload<Document>, Response>,
) -> impl IntoResponse {
    let body = payload.map(|Payload(document)| request::Body::Full(document));
    service(ctx, principal, Action::Update, id, body).await
}

pub async fn patch(
    principal: Principal,
    State(ctx): State<Arc<Context>>,
    Path(id): Path<String>,
    payload: Result<Payload<Changes>, Response>,
) -> impl IntoResponse {
    let body = payload.map(|Payload(changes)| request::Body::Partial(changes));
    service(ctx, principal, Action::PartialUpdate, id, body).await
}
