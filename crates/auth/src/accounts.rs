//! Account administration.
//!
//! Every operation takes the caller's [`Authorities`] and runs its tier,
//! permission, and escalation checks before the store is written. Targets are
//! loaded first so the guard sees their roles as they were before the change.

use std::collections::BTreeSet;
use std::sync::Arc;

use warden_core::{AccessError, AccessResult, RoleId, UserId};

use crate::authorize::{guard_target_access, require_permission, require_tier, require_tier_or_self};
use crate::password::CredentialHasher;
use crate::permissions::{self, MANAGE_USER_PERMISSIONS, Permission};
use crate::principal::Authorities;
use crate::privilege::{
    resolve_functional_roles, resolve_role_permissions, resolve_roles_for_creation,
    resolve_roles_for_update,
};
use crate::roles::{RoleName, Tier};
use crate::store::IdentityStore;
use crate::user::{Role, User, UserView};

/// Profile fields a caller may change on an account. Roles are separate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn IdentityStore>,
    hasher: Arc<dyn CredentialHasher>,
}

fn log_denial(caller: &Authorities, target: Option<UserId>, err: &AccessError) {
    if let AccessError::Forbidden(reason) = err {
        tracing::warn!(
            caller = %caller.username,
            target = ?target,
            reason = %reason,
            "access denied"
        );
    }
}

impl AccountService {
    pub fn new(store: Arc<dyn IdentityStore>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }

    // ── self service ────────────────────────────────────────────────────────

    /// Public self-registration. Always yields a `ROLE_USER` account; the
    /// request has no way to express anything else.
    pub async fn register(&self, username: &str, password: &str, email: &str) -> AccessResult<UserView> {
        let user = self
            .new_user(username, password, email, BTreeSet::from([RoleName::USER]))
            .await?;
        let saved = self.store.save_user(user).await?;
        tracing::info!(username = %saved.username, user_id = %saved.id, "account registered");
        Ok(saved.into())
    }

    pub async fn me(&self, caller: &Authorities) -> AccessResult<UserView> {
        let user = self
            .store
            .find_user_by_username(&caller.username)
            .await?
            .ok_or_else(|| AccessError::not_found(format!("user {}", caller.username)))?;
        Ok(user.into())
    }

    // ── user administration ─────────────────────────────────────────────────

    pub async fn list_users(&self, caller: &Authorities) -> AccessResult<Vec<UserView>> {
        require_tier(caller, Tier::Admin).inspect_err(|e| log_denial(caller, None, e))?;
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserView::from).collect())
    }

    pub async fn get_user(&self, caller: &Authorities, id: UserId) -> AccessResult<UserView> {
        let user = self.load_user(id).await?;
        require_tier_or_self(caller, Tier::Admin, &user.username)
            .inspect_err(|e| log_denial(caller, Some(id), e))?;
        Ok(user.into())
    }

    /// Create an account on behalf of `caller`. Requested roles are filtered
    /// by the caller's tier; the account never ends up without a role.
    pub async fn create_user(
        &self,
        caller: &Authorities,
        username: &str,
        password: &str,
        email: &str,
        requested_roles: &[RoleName],
    ) -> AccessResult<UserView> {
        require_tier(caller, Tier::Editor).inspect_err(|e| log_denial(caller, None, e))?;

        let roles = resolve_roles_for_creation(caller, requested_roles);
        let user = self.new_user(username, password, email, roles).await?;
        let saved = self.store.save_user(user).await?;
        tracing::info!(
            caller = %caller.username,
            user_id = %saved.id,
            roles = ?saved.roles,
            "account created"
        );
        Ok(saved.into())
    }

    /// Change email and/or password. Blank passwords are ignored.
    pub async fn update_user(
        &self,
        caller: &Authorities,
        id: UserId,
        update: ProfileUpdate,
    ) -> AccessResult<UserView> {
        let mut user = self.load_user(id).await?;
        let is_self = caller.username == user.username;
        require_tier_or_self(caller, Tier::Editor, &user.username)
            .inspect_err(|e| log_denial(caller, Some(id), e))?;
        if !is_self {
            guard_target_access(caller, &user.roles)
                .into_result()
                .inspect_err(|e| log_denial(caller, Some(id), e))?;
        }

        if let Some(email) = update.email {
            user.set_email(email)?;
        }
        if let Some(password) = update.password.filter(|p| !p.trim().is_empty()) {
            user.password = self.hash(&password)?;
        }

        let saved = self.store.save_user(user).await?;
        Ok(saved.into())
    }

    pub async fn update_roles(
        &self,
        caller: &Authorities,
        id: UserId,
        requested_roles: &[RoleName],
    ) -> AccessResult<UserView> {
        require_tier(caller, Tier::Admin).inspect_err(|e| log_denial(caller, Some(id), e))?;

        let mut user = self.load_user(id).await?;
        let roles = resolve_roles_for_update(caller, requested_roles, &user.roles)
            .inspect_err(|e| log_denial(caller, Some(id), e))?;
        user.set_roles(roles)?;

        let saved = self.store.save_user(user).await?;
        tracing::info!(caller = %caller.username, user_id = %id, roles = ?saved.roles, "roles updated");
        Ok(saved.into())
    }

    pub async fn delete_user(&self, caller: &Authorities, id: UserId) -> AccessResult<()> {
        require_tier(caller, Tier::Admin).inspect_err(|e| log_denial(caller, Some(id), e))?;

        let user = self.load_user(id).await?;
        guard_target_access(caller, &user.roles)
            .into_result()
            .inspect_err(|e| log_denial(caller, Some(id), e))?;

        self.store.delete_user_by_id(id).await?;
        tracing::info!(caller = %caller.username, user_id = %id, "account deleted");
        Ok(())
    }

    // ── IAM administration ──────────────────────────────────────────────────

    /// Effective permission codes of a user, sorted.
    pub async fn user_permissions(&self, caller: &Authorities, id: UserId) -> AccessResult<Vec<Permission>> {
        self.require_iam(caller, Some(id))?;
        let user = self.load_user(id).await?;
        let records = self.store.find_all_roles().await?;

        let mut codes = BTreeSet::new();
        for name in &user.roles {
            codes.extend(permissions::permissions_for_role(name.as_str()));
            if let Some(role) = records.iter().find(|r| &r.name == name) {
                codes.extend(role.permissions.iter().cloned());
            }
        }
        Ok(codes.into_iter().collect())
    }

    /// Replace a user's functional roles with the ones that grant `codes`.
    pub async fn set_user_permissions(
        &self,
        caller: &Authorities,
        id: UserId,
        codes: &[String],
    ) -> AccessResult<UserView> {
        self.require_iam(caller, Some(id))?;
        let mut user = self.load_user(id).await?;
        guard_target_access(caller, &user.roles)
            .into_result()
            .inspect_err(|e| log_denial(caller, Some(id), e))?;

        let roles = resolve_functional_roles(codes.iter().map(String::as_str), &user.roles)?;
        user.set_roles(roles)?;

        let saved = self.store.save_user(user).await?;
        tracing::info!(caller = %caller.username, user_id = %id, roles = ?saved.roles, "functional roles updated");
        Ok(saved.into())
    }

    pub fn list_permissions(&self, caller: &Authorities) -> AccessResult<Vec<Permission>> {
        self.require_iam(caller, None)?;
        Ok(permissions::ALL.to_vec())
    }

    pub async fn list_roles(&self, caller: &Authorities) -> AccessResult<Vec<Role>> {
        self.require_iam(caller, None)?;
        Ok(self.store.find_all_roles().await?)
    }

    pub async fn role_permissions(&self, caller: &Authorities, role_id: RoleId) -> AccessResult<BTreeSet<Permission>> {
        self.require_iam(caller, None)?;
        Ok(self.load_role(role_id).await?.permissions)
    }

    /// Replace the stored permission set of a role. One unknown code rejects
    /// the request and leaves the role untouched.
    pub async fn update_role_permissions(
        &self,
        caller: &Authorities,
        role_id: RoleId,
        codes: &[String],
    ) -> AccessResult<Role> {
        self.require_iam(caller, None)?;
        let mut role = self.load_role(role_id).await?;
        role.permissions = resolve_role_permissions(codes.iter().map(String::as_str))?;

        let saved = self.store.save_role(role).await?;
        tracing::info!(caller = %caller.username, role = %saved.name, "role permissions replaced");
        Ok(saved)
    }

    // ── helpers ─────────────────────────────────────────────────────────────

    fn require_iam(&self, caller: &Authorities, target: Option<UserId>) -> AccessResult<()> {
        require_permission(caller, &MANAGE_USER_PERMISSIONS).inspect_err(|e| log_denial(caller, target, e))
    }

    async fn load_user(&self, id: UserId) -> AccessResult<User> {
        self.store
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| AccessError::not_found(format!("user {id}")))
    }

    async fn load_role(&self, id: RoleId) -> AccessResult<Role> {
        self.store
            .find_role_by_id(id)
            .await?
            .ok_or_else(|| AccessError::not_found(format!("role {id}")))
    }

    async fn new_user(
        &self,
        username: &str,
        password: &str,
        email: &str,
        roles: BTreeSet<RoleName>,
    ) -> AccessResult<User> {
        if password.is_empty() {
            return Err(AccessError::validation("password cannot be empty"));
        }
        if self.store.exists_by_username(username.trim()).await? {
            return Err(AccessError::validation("username already taken"));
        }
        User::new(username, self.hash(password)?, email, roles)
    }

    fn hash(&self, password: &str) -> AccessResult<crate::password::HashedPassword> {
        self.hasher.hash(password).map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            AccessError::store("password hashing failed")
        })
    }
}

impl core::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}
