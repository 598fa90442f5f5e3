use super::types::response;
use crate::{
    modules::{
        auth::middleware::Principal,
        geostory::{
            permissions::{self, Action},
            repository::CreateGeoStoryPayload,
            routes::body::Document,
        },
    },
    types::Context,
};
use axum::response::Response;
use std::sync::Arc;
use validator::Validate;

pub async fn service(
    ctx: Arc<Context>,
    principal: Principal,
    payload: Result<Document, Response>,
) -> response::Response {
    ctx.geostories
        .check_permissions(&principal, Action::Create)
        .await
        .map_err(response::Error::Denied)?;

    let Some(owner) = principal.user() else {
        return Err(response::Error::Denied(
            permissions::Error::NotAuthenticated,
        ));
    };

    let document = payload.map_err(response::Error::InvalidBody)?;
    document.validate().map_err(|errors| {
        tracing::warn!("Failed to validate payload: {errors}");
        response::Error::FailedToValidate(errors)
    })?;

    let story = ctx
        .db
        .create_geostory(CreateGeoStoryPayload {
            owner_id: owner.id.clone(),
            title: document.title,
            description: document.description.flatten(),
            thumbnail_url: document.thumbnail_url.flatten(),
            data: document.data,
            is_public: document.is_public.flatten().unwrap_or(false),
        })
        .await
        .map_err(|_| response::Error::FailedToCreateGeoStory)?;

    tracing::info!("GeoStory {} created by {}", story.id, owner.id);

    Ok(response::Success::GeoStoryCreated(story))
}
