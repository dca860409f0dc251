//! Identity store contract.
//!
//! Each call is a single request/response against the backing store. No
//! transactional isolation is assumed across calls: a read followed by a
//! conditional write is last-writer-wins against concurrent updates.

use std::sync::Arc;

use thiserror::Error;

use warden_core::{AccessError, RoleId, UserId};

use crate::user::{Role, User};

mod in_memory;

pub use in_memory::InMemoryIdentityStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The record addressed by a write or delete does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated (username, role name).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Connectivity, serialization, or other backend failure.
    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AccessError::NotFound(what),
            StoreError::Conflict(msg) => AccessError::Validation(msg),
            StoreError::Backend(msg) => AccessError::Store(msg),
        }
    }
}

/// Lookup/persistence of users and roles.
///
/// Lookups return `Ok(None)` for missing records; callers decide whether that
/// terminates the current operation.
#[async_trait::async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Insert or replace a user (keyed by id). Every role name must exist.
    async fn save_user(&self, user: User) -> Result<User, StoreError>;

    async fn delete_user_by_id(&self, id: UserId) -> Result<(), StoreError>;

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;

    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError>;

    async fn find_all_roles(&self) -> Result<Vec<Role>, StoreError>;

    /// Insert or replace a role (keyed by id).
    async fn save_role(&self, role: Role) -> Result<Role, StoreError>;
}

#[async_trait::async_trait]
impl<S> IdentityStore for Arc<S>
where
    S: IdentityStore + ?Sized,
{
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        (**self).find_user_by_username(username).await
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        (**self).find_user_by_id(id).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        (**self).exists_by_username(username).await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        (**self).list_users().await
    }

    async fn save_user(&self, user: User) -> Result<User, StoreError> {
        (**self).save_user(user).await
    }

    async fn delete_user_by_id(&self, id: UserId) -> Result<(), StoreError> {
        (**self).delete_user_by_id(id).await
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        (**self).find_role_by_name(name).await
    }

    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        (**self).find_role_by_id(id).await
    }

    async fn find_all_roles(&self) -> Result<Vec<Role>, StoreError> {
        (**self).find_all_roles().await
    }

    async fn save_role(&self, role: Role) -> Result<Role, StoreError> {
        (**self).save_role(role).await
    }
}
