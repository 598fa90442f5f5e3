use super::types::response;
use crate::{
    modules::{auth::middleware::Principal, geostory::permissions::Action},
    types::Context,
    utils::pagination::PageRequest,
};
use std::sync::Arc;

pub async fn service(
    ctx: Arc<Context>,
    principal: Principal,
    page: PageRequest,
    params: Vec<(String, String)>,
) -> response::Response {
    let endpoint = &ctx.geostories;

    endpoint
        .check_permissions(&principal, Action::List)
        .await
        .map_err(response::Error::Denied)?;

    let query = endpoint
        .filter_query(&principal, &params)
        .map_err(response::Error::InvalidQuery)?;
    let pagination = endpoint
        .pagination
        .resolve(&page)
        .map_err(response::Error::InvalidPage)?;

    ctx.db
        .find_geostories(&query, &pagination)
        .await
        .map_err(|_| response::Error::FailedToFetchGeoStories)
        .map(response::Success::GeoStories)
}
