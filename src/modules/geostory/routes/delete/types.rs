pub mod response {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{modules::geostory::permissions, utils::response};

    pub enum Success {
        GeoStoryDeleted,
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::GeoStoryDeleted => StatusCode::NO_CONTENT.into_response(),
            }
        }
    }

    pub enum Error {
        Denied(permissions::Error),
        GeoStoryNotFound,
        FailedToFetchGeoStory,
        FailedToDeleteGeoStory,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Denied(err) => err.into_response(),
                Self::GeoStoryNotFound => response::not_found("GeoStory not found"),
                Self::FailedToFetchGeoStory => response::unexpected("Failed to fetch geostory"),
                Self::FailedToDeleteGeoStory => response::unexpected("Failed to delete geostory"),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
