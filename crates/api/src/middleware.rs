use axum::{
    extract::State,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use warden_auth::Authenticator;

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Authenticator,
}

/// Reject requests without a valid bearer token; otherwise attach the
/// caller's [`PrincipalContext`]. Every rejection has the same body.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let authorities = state
        .authenticator
        .authenticate_bearer(header, Utc::now())
        .map_err(errors::access_error_to_response)?;

    req.extensions_mut().insert(PrincipalContext::new(authorities));

    Ok(next.run(req).await)
}
