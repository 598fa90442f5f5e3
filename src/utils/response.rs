use axum::{
    extract::Json,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};

pub const NOT_FOUND: &str = "not_found";
pub const PERMISSION_DENIED: &str = "permission_denied";
pub const CSRF_FAILED: &str = "csrf_failed";
pub const NOT_AUTHENTICATED: &str = "not_authenticated";
pub const AUTHENTICATION_FAILED: &str = "authentication_failed";
pub const VALIDATION_ERROR: &str = "validation_error";
pub const UNEXPECTED_ERROR: &str = "unexpected_error";

pub fn error(status: StatusCode, code: &'static str, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "code": code, "error": message })))
}

/// 401 carrying the Basic challenge, so clients know a credential scheme to retry with.
fn challenge(code: &'static str, message: &str) -> Response {
    (
        [(header::WWW_AUTHENTICATE, "Basic realm=\"api\"")],
        error(StatusCode::UNAUTHORIZED, code, message),
    )
        .into_response()
}

pub fn not_authenticated() -> Response {
    challenge(
        NOT_AUTHENTICATED,
        "Authentication credentials were not provided",
    )
}

pub fn authentication_failed() -> Response {
    challenge(AUTHENTICATION_FAILED, "Invalid username or password")
}

pub fn not_found(message: &str) -> Response {
    error(StatusCode::NOT_FOUND, NOT_FOUND, message).into_response()
}

pub fn permission_denied() -> Response {
    error(
        StatusCode::FORBIDDEN,
        PERMISSION_DENIED,
        "You do not have permission to perform this action",
    )
    .into_response()
}

pub fn unexpected(message: &str) -> Response {
    error(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_ERROR, message).into_response()
}
