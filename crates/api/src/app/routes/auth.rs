//! Public credential endpoints.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use crate::app::dto::{LoginRequest, RegisterRequest, TokenResponse};
use crate::app::{errors, services::AppServices};

/// POST /login - exchange username/password for a bearer token
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<LoginRequest>,
) -> axum::response::Response {
    match services
        .authenticator
        .login(&req.username, &req.password, Utc::now)
        .await
    {
        Ok(issued) => (StatusCode::OK, Json(TokenResponse::from(issued))).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// POST /register - public self-registration, always `ROLE_USER`
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(req): Json<RegisterRequest>,
) -> axum::response::Response {
    match services
        .accounts
        .register(&req.username, &req.password, &req.email)
        .await
    {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}
