use super::service::service;
use crate::{
    modules::auth::middleware::Principal, types::Context, utils::pagination::PageRequest,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn handler(
    principal: Principal,
    State(ctx): State<Arc<Context>>,
    page: PageRequest,
    Query(params): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    service(ctx, principal, page, params).await
}
