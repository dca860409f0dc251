//! Identity records: user accounts and roles.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use warden_core::{AccessError, AccessResult, RoleId, UserId};

use crate::password::HashedPassword;
use crate::permissions::Permission;
use crate::roles::RoleName;

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// User account.
///
/// # Invariants
/// - `username` is non-blank and unique (uniqueness is enforced by the store).
/// - `roles` is never empty once the account exists.
/// - The password is only ever held as a one-way hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password: HashedPassword,
    pub email: String,
    pub roles: BTreeSet<RoleName>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        password: HashedPassword,
        email: impl Into<String>,
        roles: BTreeSet<RoleName>,
    ) -> AccessResult<Self> {
        let username = username.into().trim().to_string();
        if username.is_empty() {
            return Err(AccessError::validation("username cannot be empty"));
        }
        let email = email.into();
        validate_email(&email)?;
        ensure_roles(&roles)?;

        Ok(Self {
            id: UserId::new(),
            username,
            password,
            email: email.trim().to_string(),
            roles,
        })
    }

    /// Replace the role set. Rejects an empty set.
    pub fn set_roles(&mut self, roles: BTreeSet<RoleName>) -> AccessResult<()> {
        ensure_roles(&roles)?;
        self.roles = roles;
        Ok(())
    }

    pub fn set_email(&mut self, email: impl Into<String>) -> AccessResult<()> {
        let email = email.into();
        validate_email(&email)?;
        self.email = email.trim().to_string();
        Ok(())
    }

    pub fn has_role(&self, role: &RoleName) -> bool {
        self.roles.contains(role)
    }
}

fn ensure_roles(roles: &BTreeSet<RoleName>) -> AccessResult<()> {
    if roles.is_empty() {
        return Err(AccessError::validation("at least one role must be provided"));
    }
    Ok(())
}

fn validate_email(email: &str) -> AccessResult<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AccessError::validation("invalid email format"));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Role
// ─────────────────────────────────────────────────────────────────────────────

/// Role record: a unique name plus the permission codes stored against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    pub permissions: BTreeSet<Permission>,
}

impl Role {
    pub fn new(name: RoleName) -> Self {
        Self {
            id: RoleId::new(),
            name,
            permissions: BTreeSet::new(),
        }
    }
}

/// Public view of a user account (never includes the password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub roles: BTreeSet<RoleName>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
        }
    }
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            roles: user.roles,
        }
    }
}
