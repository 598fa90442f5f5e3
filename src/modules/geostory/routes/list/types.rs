pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};

    use crate::{
        modules::geostory::{filters, permissions, repository::GeoStory},
        utils::{pagination, pagination::Paginated, response},
    };

    pub enum Success {
        GeoStories(Paginated<GeoStory>),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::GeoStories(page) => (StatusCode::OK, Json(page)).into_response(),
            }
        }
    }

    pub enum Error {
        Denied(permissions::Error),
        InvalidQuery(filters::Error),
        InvalidPage(pagination::Error),
        FailedToFetchGeoStories,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Denied(err) => err.into_response(),
                Self::InvalidQuery(err) => err.into_response(),
                Self::InvalidPage(err) => err.into_response(),
                Self::FailedToFetchGeoStories => response::unexpected("Failed to fetch geostories"),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
