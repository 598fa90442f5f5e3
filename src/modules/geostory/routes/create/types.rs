pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use validator::ValidationErrors;

    use crate::{
        modules::geostory::{permissions, repository::GeoStory},
        utils::{response, validation},
    };

    pub enum Success {
        GeoStoryCreated(GeoStory),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::GeoStoryCreated(story) => (StatusCode::CREATED, Json(story)).into_response(),
            }
        }
    }

    pub enum Error {
        Denied(permissions::Error),
        InvalidBody(axum::response::Response),
        FailedToValidate(ValidationErrors),
        FailedToCreateGeoStory,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Denied(err) => err.into_response(),
                Self::InvalidBody(rejection) => rejection,
                Self::FailedToValidate(errors) => validation::into_response(errors),
                Self::FailedToCreateGeoStory => response::unexpected("Failed to create geostory"),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
