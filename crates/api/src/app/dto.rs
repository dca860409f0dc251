use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_auth::{IssuedToken, Permission, Role, RoleName};
use warden_core::RoleId;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public registration payload. Any other field (e.g. `roles`) is ignored.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<RoleName>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRolesRequest {
    pub roles: Vec<RoleName>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            token_type: "Bearer",
            expires_at: issued.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PermissionDto {
    pub code: String,
    pub resource: String,
    pub action: String,
}

impl From<&Permission> for PermissionDto {
    fn from(p: &Permission) -> Self {
        Self {
            code: p.as_str().to_string(),
            resource: p.resource().to_string(),
            action: p.action().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleDto {
    pub id: RoleId,
    pub name: RoleName,
    pub permissions: Vec<Permission>,
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            permissions: role.permissions.into_iter().collect(),
        }
    }
}
