use crate::{modules::auth::middleware::Auth, types::Context};
use axum::{
    extract::Json,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, Router},
};
use serde_json::json;
use std::sync::Arc;

async fn handler(auth: Auth) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "user": auth.user, "scheme": auth.scheme })),
    )
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/me", get(handler))
}
