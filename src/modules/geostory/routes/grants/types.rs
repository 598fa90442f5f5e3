pub mod request {
    use serde::Deserialize;
    use validator::Validate;

    use crate::modules::geostory::repository::Grant;

    #[derive(Deserialize, Validate)]
    pub struct Payload {
        #[validate(length(max = 300))]
        pub grants: Vec<Grant>,
    }
}

pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;
    use validator::ValidationErrors;

    use crate::{
        modules::geostory::{permissions, repository::Grant},
        utils::{response, validation},
    };

    pub enum Success {
        Grants(Vec<Grant>),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Grants(grants) => {
                    (StatusCode::OK, Json(json!({ "grants": grants }))).into_response()
                }
            }
        }
    }

    pub enum Error {
        Denied(permissions::Error),
        GeoStoryNotFound,
        InvalidBody(axum::response::Response),
        FailedToValidate(ValidationErrors),
        FailedToFetchGeoStory,
        FailedToFetchUser,
        FailedToFetchGrants,
        FailedToUpdateGrants,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Denied(err) => err.into_response(),
                Self::GeoStoryNotFound => response::not_found("GeoStory not found"),
                Self::InvalidBody(rejection) => rejection,
                Self::FailedToValidate(errors) => validation::into_response(errors),
                Self::FailedToFetchGeoStory => response::unexpected("Failed to fetch geostory"),
                Self::FailedToFetchUser => response::unexpected("Failed to fetch user"),
                Self::FailedToFetchGrants => response::unexpected("Failed to fetch grants"),
                Self::FailedToUpdateGrants => response::unexpected("Failed to update grants"),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
