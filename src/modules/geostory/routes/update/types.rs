pub mod request {
    use crate::modules::geostory::routes::body::{Changes, Document};

    pub enum Body {
        Full(Document),
        Partial(Changes),
    }
}

pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use validator::ValidationErrors;

    use crate::{
        modules::geostory::{permissions, repository::GeoStory},
        utils::{response, validation},
    };

    pub enum Success {
        GeoStoryUpdated(GeoStory),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::GeoStoryUpdated(story) => (StatusCode::OK, Json(story)).into_response(),
            }
        }
    }

    pub enum Error {
        Denied(permissions::Error),
        GeoStoryNotFound,
        InvalidBody(axum::response::Response),
        FailedToValidate(ValidationErrors),
        FailedToFetchGeoStory,
        FailedToUpdateGeoStory,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Denied(err) => err.into_response(),
                Self::GeoStoryNotFound => response::not_found("GeoStory not found"),
                Self::InvalidBody(rejection) => rejection,
                Self::FailedToValidate(errors) => validation::into_response(errors),
                Self::FailedToFetchGeoStory => response::unexpected("Failed to fetch geostory"),
                Self::FailedToUpdateGeoStory => response::unexpected("Failed to update geostory"),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
