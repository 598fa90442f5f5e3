mod me;
mod sign_in;
mod sign_out;

use crate::types::Context;
use axum::routing::Router;
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .merge(sign_in::get_router())
        .merge(sign_out::get_router())
        .merge(me::get_router())
}
