pub mod response {
    use axum::{http::StatusCode, response::IntoResponse};
    use axum_extra::extract::cookie::CookieJar;

    use crate::utils::response;

    pub enum Success {
        SignedOut(CookieJar),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::SignedOut(jar) => (StatusCode::NO_CONTENT, jar).into_response(),
            }
        }
    }

    pub enum Error {
        FailedToSignOut,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToSignOut => response::unexpected("Failed to sign out"),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
