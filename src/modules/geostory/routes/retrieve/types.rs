pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};

    use crate::{
        modules::geostory::{permissions, repository::GeoStory},
        utils::response,
    };

    pub enum Success {
        GeoStory(GeoStory),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::GeoStory(story) => (StatusCode::OK, Json(story)).into_response(),
            }
        }
    }

    pub enum Error {
        Denied(permissions::Error),
        GeoStoryNotFound,
        FailedToFetchGeoStory,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Denied(err) => err.into_response(),
                Self::GeoStoryNotFound => response::not_found("GeoStory not found"),
                Self::FailedToFetchGeoStory => response::unexpected("Failed to fetch geostory"),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
