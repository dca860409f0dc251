//! IAM endpoints under `/admin/users`. All require `IAM:MANAGE_USER_PERMISSIONS`.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use warden_core::{RoleId, UserId};

use crate::app::dto::{PermissionDto, RoleDto};
use crate::app::{errors, services::AppServices};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/permissions", get(list_permissions))
        .route("/roles", get(list_roles))
        .route(
            "/roles/:role_id/permissions",
            get(get_role_permissions).put(update_role_permissions),
        )
        .route(
            "/:id/permissions",
            get(get_user_permissions).put(set_user_permissions),
        )
}

/// GET /admin/users/:id/permissions - effective permission codes of a user
pub async fn get_user_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.accounts.user_permissions(principal.authorities(), id).await {
        Ok(codes) => (StatusCode::OK, Json(codes)).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// PUT /admin/users/:id/permissions - grant functional permissions via roles
pub async fn set_user_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(codes): Json<Vec<String>>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services
        .accounts
        .set_user_permissions(principal.authorities(), id, &codes)
        .await
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// GET /admin/users/permissions - the whole permission catalog
pub async fn list_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.accounts.list_permissions(principal.authorities()) {
        Ok(perms) => {
            let perms: Vec<PermissionDto> = perms.iter().map(PermissionDto::from).collect();
            (StatusCode::OK, Json(perms)).into_response()
        }
        Err(e) => errors::access_error_to_response(e),
    }
}

/// GET /admin/users/roles - every role record with its stored permissions
pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.accounts.list_roles(principal.authorities()).await {
        Ok(roles) => {
            let roles: Vec<RoleDto> = roles.into_iter().map(RoleDto::from).collect();
            (StatusCode::OK, Json(roles)).into_response()
        }
        Err(e) => errors::access_error_to_response(e),
    }
}

/// GET /admin/users/roles/:role_id/permissions
pub async fn get_role_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(role_id): Path<String>,
) -> axum::response::Response {
    let role_id: RoleId = match errors::parse_id(&role_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.accounts.role_permissions(principal.authorities(), role_id).await {
        Ok(perms) => (StatusCode::OK, Json(perms)).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// PUT /admin/users/roles/:role_id/permissions - replace a role's permission set
pub async fn update_role_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(role_id): Path<String>,
    Json(codes): Json<Vec<String>>,
) -> axum::response::Response {
    let role_id: RoleId = match errors::parse_id(&role_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services
        .accounts
        .update_role_permissions(principal.authorities(), role_id, &codes)
        .await
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}
