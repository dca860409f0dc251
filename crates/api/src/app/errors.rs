use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use warden_core::AccessError;

/// Map the access taxonomy onto HTTP. Store failures are logged here and
/// answered with a generic body.
pub fn access_error_to_response(err: AccessError) -> axum::response::Response {
    let code = err.code();
    match err {
        AccessError::Unauthenticated => json_error(StatusCode::UNAUTHORIZED, code, "unauthorized"),
        AccessError::Forbidden(reason) => json_error(StatusCode::FORBIDDEN, code, reason),
        AccessError::Validation(reason) => json_error(StatusCode::BAD_REQUEST, code, reason),
        AccessError::NotFound(what) => json_error(StatusCode::NOT_FOUND, code, format!("{what} not found")),
        AccessError::Store(msg) => {
            tracing::error!(error = %msg, "identity store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, code, "internal error")
        }
    }
}

/// Parse a path identifier. A malformed id cannot name a record, so it is a 404.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr<Err = AccessError>,
{
    raw.parse::<T>().map_err(access_error_to_response)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
