use std::collections::HashMap;
use std::sync::RwLock;

use warden_core::{RoleId, UserId};

use super::{IdentityStore, StoreError};
use crate::user::{Role, User};

/// In-memory identity store for tests/dev.
///
/// Enforces the same uniqueness rules as the SQL schema: one user per
/// username, one role per name, and users may only reference existing roles.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    users: RwLock<HashMap<UserId, User>>,
    roles: RwLock<HashMap<RoleId, Role>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(&id).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.values().any(|u| u.username == username))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn save_user(&self, user: User) -> Result<User, StoreError> {
        {
            let roles = self.roles.read().map_err(poisoned)?;
            for name in &user.roles {
                if !roles.values().any(|r| &r.name == name) {
                    return Err(StoreError::NotFound(format!("role {name}")));
                }
            }
        }

        let mut users = self.users.write().map_err(poisoned)?;
        if users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(StoreError::Conflict(format!(
                "username '{}' is already taken",
                user.username
            )));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user_by_id(&self, id: UserId) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(poisoned)?;
        match users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("user {id}"))),
        }
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let roles = self.roles.read().map_err(poisoned)?;
        Ok(roles.values().find(|r| r.name.as_str() == name).cloned())
    }

    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        let roles = self.roles.read().map_err(poisoned)?;
        Ok(roles.get(&id).cloned())
    }

    async fn find_all_roles(&self) -> Result<Vec<Role>, StoreError> {
        let roles = self.roles.read().map_err(poisoned)?;
        let mut all: Vec<Role> = roles.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn save_role(&self, role: Role) -> Result<Role, StoreError> {
        let mut roles = self.roles.write().map_err(poisoned)?;
        if roles.values().any(|r| r.name == role.name && r.id != role.id) {
            return Err(StoreError::Conflict(format!("role '{}' already exists", role.name)));
        }
        roles.insert(role.id, role.clone());
        Ok(role)
    }
}
