mod body;
mod create;
mod delete;
mod grants;
mod list;
mod retrieve;
mod update;

use crate::types::Context;
use axum::routing::{get, MethodRouter, Router};
use std::sync::Arc;

/// Registers `path` both with and without a trailing slash.
fn route(
    router: Router<Arc<Context>>,
    path: &str,
    method_router: MethodRouter<Arc<Context>>,
) -> Router<Arc<Context>> {
    router
        .route(path, method_router.clone())
        .route(&format!("{path}/"), method_router)
}

pub fn get_router() -> Router<Arc<Context>> {
    let router = Router::new();

    let router = route(
        router,
        "/geostories",
        get(list::handler::handler).post(create::handler::handler),
    );
    let router = route(
        router,
        "/geostories/:id",
        get(retrieve::handler::handler)
            .put(update::handler::put)
            .patch(update::handler::patch)
            .delete(delete::handler::handler),
    );

    route(
        router,
        "/geostories/:id/permissions",
        get(grants::handler::get).put(grants::handler::put),
    )
}
