use super::types::response;
use crate::{
    modules::{auth::middleware::Principal, geostory::permissions::Action},
    types::Context,
};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, principal: Principal, id: String) -> response::Response {
    let endpoint = &ctx.geostories;

    endpoint
        .check_permissions(&principal, Action::Destroy)
        .await
        .map_err(response::Error::Denied)?;

    let story = endpoint
        .get_object(ctx.db.as_ref(), &principal, &id)
        .await
        .map_err(|_| response::Error::FailedToFetchGeoStory)?
        .ok_or(response::Error::GeoStoryNotFound)?;

    endpoint
        .check_object_permissions(ctx.db.as_ref(), &principal, Action::Destroy, &story)
        .await
        .map_err(response::Error::Denied)?;

    let deleted = ctx
        .db
        .delete_geostory(&story.id)
        .await
        .map_err(|_| response::Error::FailedToDeleteGeoStory)?;

    if !deleted {
        return Err(response::Error::GeoStoryNotFound);
    }

    tracing::info!("GeoStory {} deleted", story.id);

    Ok(response::Success::GeoStoryDeleted)
}
