//! Start-up seeding: the fixed role list and an optional bootstrap account.

use std::collections::BTreeSet;

use anyhow::Context;

use warden_auth::permissions::permissions_for_role;
use warden_auth::roles::SEEDED_ROLES;
use warden_auth::{CredentialHasher, IdentityStore, Role, RoleName, User};

/// Ensure every seeded role exists. Roles with a catalog mapping get their
/// stored permissions reset to that mapping; the rest keep what is stored.
pub async fn seed_roles(store: &dyn IdentityStore) -> anyhow::Result<Vec<Role>> {
    let mut seeded = Vec::with_capacity(SEEDED_ROLES.len());

    for name in SEEDED_ROLES {
        let existing = store
            .find_role_by_name(name.as_str())
            .await
            .with_context(|| format!("looking up role {name}"))?;
        let mut role = existing.unwrap_or_else(|| Role::new(name.clone()));

        let mapped = permissions_for_role(name.as_str());
        if !mapped.is_empty() {
            role.permissions = mapped;
        }

        let role = store
            .save_role(role)
            .await
            .with_context(|| format!("saving role {name}"))?;
        seeded.push(role);
    }

    tracing::info!(count = seeded.len(), "roles seeded");
    Ok(seeded)
}

/// Credentials for the initial `ROLE_SUPER_ADMIN` account.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

/// Create the bootstrap super-admin unless the username is already taken.
/// Returns whether an account was created. An existing account is left as is.
pub async fn bootstrap_super_admin(
    store: &dyn IdentityStore,
    hasher: &dyn CredentialHasher,
    admin: &BootstrapAdmin,
) -> anyhow::Result<bool> {
    if store
        .exists_by_username(&admin.username)
        .await
        .context("checking bootstrap admin")?
    {
        tracing::debug!(username = %admin.username, "bootstrap admin already present");
        return Ok(false);
    }

    let password = hasher
        .hash(&admin.password)
        .context("hashing bootstrap admin password")?;
    let user = User::new(
        admin.username.as_str(),
        password,
        admin.email.as_str(),
        BTreeSet::from([RoleName::SUPER_ADMIN]),
    )
    .context("building bootstrap admin")?;

    store
        .save_user(user)
        .await
        .context("saving bootstrap admin")?;
    tracing::info!(username = %admin.username, "bootstrap super-admin created");
    Ok(true)
}
