//! `warden-auth`: authorization and privilege-escalation engine.
//!
//! HTTP and SQL live elsewhere; this crate only sees the [`IdentityStore`]
//! and [`CredentialHasher`] contracts.

pub mod accounts;
pub mod authenticate;
pub mod authorize;
pub mod claims;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod privilege;
pub mod roles;
pub mod store;
pub mod token;
pub mod user;

pub use accounts::{AccountService, ProfileUpdate};
pub use authenticate::{AuthenticationFailure, Authenticator, IssuedToken, extract_bearer};
pub use authorize::{GuardDecision, guard_target_access, require_permission, require_tier};
pub use claims::{TokenClaims, TokenError, validate_claims};
pub use password::{Argon2Hasher, CredentialHasher, HashError, HashedPassword};
pub use permissions::Permission;
pub use principal::Authorities;
pub use privilege::{
    resolve_functional_roles, resolve_role_permissions, resolve_roles_for_creation,
    resolve_roles_for_update,
};
pub use roles::{RoleName, Tier};
pub use store::{IdentityStore, InMemoryIdentityStore, StoreError};
pub use token::{MAX_TTL_MS, TokenCodec};
pub use user::{Role, User, UserView};
