//! Account endpoints under `/users`.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use warden_auth::ProfileUpdate;
use warden_core::UserId;

use crate::app::dto::{CreateUserRequest, UpdateRolesRequest, UpdateUserRequest};
use crate::app::{errors, services::AppServices};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/me", get(me))
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/roles", put(update_roles))
}

/// GET /users/me - the caller's own account
pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.accounts.me(principal.authorities()).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// GET /users - all accounts (ADMIN+)
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.accounts.list_users(principal.authorities()).await {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// GET /users/:id - one account (ADMIN+ or self)
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.accounts.get_user(principal.authorities(), id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// POST /users - create an account (EDITOR+; roles filtered by caller tier)
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(req): Json<CreateUserRequest>,
) -> axum::response::Response {
    let created = services
        .accounts
        .create_user(
            principal.authorities(),
            &req.username,
            &req.password,
            &req.email,
            &req.roles,
        )
        .await;

    match created {
        Ok(user) => {
            let location = format!("/users/{}", user.id);
            (StatusCode::CREATED, [(header::LOCATION, location)], Json(user)).into_response()
        }
        Err(e) => errors::access_error_to_response(e),
    }
}

/// PUT /users/:id - change email/password (EDITOR+ or self)
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let update = ProfileUpdate {
        email: req.email,
        password: req.password,
    };
    match services.accounts.update_user(principal.authorities(), id, update).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// PUT /users/:id/roles - replace tier roles (ADMIN+)
pub async fn update_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRolesRequest>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services
        .accounts
        .update_roles(principal.authorities(), id, &req.roles)
        .await
    {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// DELETE /users/:id - remove an account (ADMIN+)
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.accounts.delete_user(principal.authorities(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}
