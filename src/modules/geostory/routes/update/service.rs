use super::types::{request, response};
use crate::{
    modules::{
        auth::middleware::Principal,
        geostory::{permissions::Action, repository::UpdateGeoStoryPayload},
    },
    types::Context,
};
use axum::response::Response;
use std::sync::Arc;
use validator::Validate;

pub async fn service(
    ctx: Arc<Context>,
    principal: Principal,
    action: Action,
    id: String,
    body: Result<request::Body, Response>,
) -> response::Response {
    let endpoint = &ctx.geostories;

    endpoint
        .check_permissions(&principal, action)
        .await
        .map_err(response::Error::Denied)?;

    let story = endpoint
        .get_object(ctx.db.as_ref(), &principal, &id)
        .await
        .map_err(|_| response::Error::FailedToFetchGeoStory)?
        .ok_or(response::Error::GeoStoryNotFound)?;

    endpoint
        .check_object_permissions(ctx.db.as_ref(), &principal, action, &story)
        .await
        .map_err(response::Error::Denied)?;

    let body = body.map_err(response::Error::InvalidBody)?;
    let validated = match &body {
        request::Body::Full(document) => document.validate(),
        request::Body::Partial(changes) => changes.validate(),
    };
    validated.map_err(|errors| {
        tracing::warn!("Failed to validate payload: {errors}");
        response::Error::FailedToValidate(errors)
    })?;

    let payload = match body {
        request::Body::Full(document) => UpdateGeoStoryPayload::from(document),
        request::Body::Partial(changes) => UpdateGeoStoryPayload::from(changes),
    };

    ctx.db
        .update_geostory(&story.id, payload)
        .await
        .map_err(|_| response::Error::FailedToUpdateGeoStory)?
        .ok_or(response::Error::GeoStoryNotFound)
        .map(response::Success::GeoStoryUpdated)
}
