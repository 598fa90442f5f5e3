use super::types::{request, response};
use crate::{
    modules::{
        auth::middleware::Principal,
        geostory::{permissions::Action, repository::GeoStory},
    },
    types::Context,
};
use axum::response::Response;
use std::borrow::Cow;
use std::sync::Arc;
use validator::{Validate, ValidationError, ValidationErrors};

async fn authorized_story(
    ctx: &Context,
    principal: &Principal,
    action: Action,
    id: &str,
) -> Result<GeoStory, response::Error> {
    let endpoint = &ctx.geostories;

    endpoint
        .check_permissions(principal, action)
        .await
        .map_err(response::Error::Denied)?;

    let story = endpoint
        .get_object(ctx.db.as_ref(), principal, id)
        .await
        .map_err(|_| response::Error::FailedToFetchGeoStory)?
        .ok_or(response::Error::GeoStoryNotFound)?;

    endpoint
        .check_object_permissions(ctx.db.as_ref(), principal, action, &story)
        .await
        .map_err(response::Error::Denied)?;

    Ok(story)
}

pub async fn list_grants(
    ctx: Arc<Context>,
    principal: Principal,
    id: String,
) -> response::Response {
    let story = authorized_story(&ctx, &principal, Action::ViewGrants, &id).await?;

    ctx.db
        .find_geostory_grants(&story.id)
        .await
        .map_err(|_| response::Error::FailedToFetchGrants)
        .map(response::Success::Grants)
}

pub async fn replace_grants(
    ctx: Arc<Context>,
    principal: Principal,
    id: String,
    payload: Result<request::Payload, Response>,
) -> response::Response {
    let story = authorized_story(&ctx, &principal, Action::ChangeGrants, &id).await?;

    let payload = payload.map_err(response::Error::InvalidBody)?;
    payload.validate().map_err(|errors| {
        tracing::warn!("Failed to validate payload: {errors}");
        response::Error::FailedToValidate(errors)
    })?;

    for grant in &payload.grants {
        let user = ctx
            .db
            .find_user_by_id(&grant.user_id)
            .await
            .map_err(|_| response::Error::FailedToFetchUser)?;

        if user.is_none() {
            tracing::warn!("Refusing grant on {} for unknown user {}", story.id, grant.user_id);
            let mut errors = ValidationErrors::new();
            errors.add(
                "grants",
                ValidationError::new("UNKNOWN_USER")
                    .with_message(Cow::from(format!("Unknown user {}", grant.user_id))),
            );
            return Err(response::Error::FailedToValidate(errors));
        }
    }

    let grants = ctx
        .db
        .replace_geostory_grants(&story.id, payload.grants)
        .await
        .map_err(|_| response::Error::FailedToUpdateGrants)?;

    tracing::info!("Replaced grants on GeoStory {}", story.id);

    Ok(response::Success::Grants(grants))
}
