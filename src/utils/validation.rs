use axum::{
    async_trait,
    extract::{FromRequest, Json, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use validator::ValidationErrors;

use super::response::{self, VALIDATION_ERROR};

pub fn into_response(errors: ValidationErrors) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "code": VALIDATION_ERROR,
            "error": "Failed to validate payload",
            "errors": errors
        })),
    )
        .into_response()
}

/// JSON body extractor whose rejections share the validation error shape.
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(payload)) => Ok(Self(payload)),
            Err(rejection) => {
                tracing::debug!("Rejected request body: {}", rejection.body_text());
                Err(response::error(
                    StatusCode::BAD_REQUEST,
                    VALIDATION_ERROR,
                    &rejection.body_text(),
                )
                .into_response())
            }
        }
    }
}
