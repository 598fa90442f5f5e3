pub mod request {
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Deserialize, Validate)]
    pub struct Payload {
        #[validate(length(min = 1, max = 150))]
        pub username: String,
        #[validate(length(min = 1))]
        pub password: String,
    }
}

pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use axum_extra::extract::cookie::CookieJar;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use validator::ValidationErrors;

    use crate::{
        modules::user::repository::User,
        utils::{response, validation},
    };

    pub enum Success {
        SignedIn {
            jar: CookieJar,
            user: User,
            csrf_token: String,
            expires_at: DateTime<Utc>,
        },
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::SignedIn {
                    jar,
                    user,
                    csrf_token,
                    expires_at,
                } => (
                    StatusCode::OK,
                    jar,
                    Json(json!({
                        "user": user,
                        "csrf_token": csrf_token,
                        "expires_at": expires_at
                    })),
                )
                    .into_response(),
            }
        }
    }

    pub enum Error {
        FailedToValidate(ValidationErrors),
        InvalidCredentials,
        FailedToSignIn,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToValidate(errors) => validation::into_response(errors),
                Self::InvalidCredentials => response::error(
                    StatusCode::UNAUTHORIZED,
                    response::AUTHENTICATION_FAILED,
                    "Invalid username or password",
                )
                .into_response(),
                Self::FailedToSignIn => response::unexpected("Failed to sign in"),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
