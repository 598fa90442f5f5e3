use super::service::service;
use crate::{
    modules::{auth::middleware::Principal, geostory::routes::body::Document},
    types::Context,
    utils::validation::Payload,
};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub async fn handler(
    principal: Principal,
    State(ctx): State<Arc<Context>>,
    payload: Result<Payload<Document>, Response>,
) -> impl IntoResponse {
    service(ctx, principal, payload.map(|Payload(document)| document)).await
}
