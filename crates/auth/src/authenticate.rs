//! Authentication pipeline.
//!
//! Two entry points: [`Authenticator::login`] turns credentials into a signed
//! token, [`Authenticator::authenticate_bearer`] turns a presented token back
//! into an [`Authorities`] value. Both collapse every failure cause into
//! [`AccessError::Unauthenticated`] once the cause has been logged.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use warden_core::{AccessError, AccessResult};

use crate::claims::TokenError;
use crate::password::{CredentialHasher, HashError, HashedPassword};
use crate::principal::Authorities;
use crate::store::IdentityStore;
use crate::token::TokenCodec;
use crate::user::Role;

/// Internal cause of an authentication failure. Never returned to clients.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticationFailure {
    #[error("bad credentials")]
    BadCredentials,

    #[error("missing or malformed bearer header")]
    MissingToken,

    #[error("token rejected: {0}")]
    Token(#[from] TokenError),
}

impl From<AuthenticationFailure> for AccessError {
    fn from(_: AuthenticationFailure) -> Self {
        AccessError::Unauthenticated
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthenticationFailure> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthenticationFailure::MissingToken)?;

    if token.is_empty() {
        return Err(AuthenticationFailure::MissingToken);
    }
    Ok(token)
}

/// A freshly minted bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Plaintext behind the decoy hash compared against when a username is unknown.
const DECOY_PASSWORD: &str = "warden-decoy-credential";

#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn IdentityStore>,
    hasher: Arc<dyn CredentialHasher>,
    codec: Arc<TokenCodec>,
    decoy: HashedPassword,
}

impl Authenticator {
    /// Hashes the decoy credential used for unknown usernames.
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: Arc<dyn CredentialHasher>,
        codec: Arc<TokenCodec>,
    ) -> Result<Self, HashError> {
        let decoy = hasher.hash(DECOY_PASSWORD)?;
        Ok(Self {
            store,
            hasher,
            codec,
            decoy,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Check `username`/`password` and mint a token carrying the user's full
    /// authority set. `clock` is read once the credentials have been checked,
    /// so the token's window starts at issuance.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        clock: impl FnOnce() -> DateTime<Utc>,
    ) -> AccessResult<IssuedToken> {
        let authorities = match self.check_credentials(username, password).await? {
            Ok(authorities) => authorities,
            Err(cause) => {
                tracing::warn!(username, %cause, "login rejected");
                return Err(cause.into());
            }
        };

        let now = clock();
        let signing_failed = |e: TokenError| {
            tracing::error!(error = %e, "token signing failed");
            AccessError::store("token signing failed")
        };
        let expires_at = self.codec.expiry_for(now).map_err(signing_failed)?;
        let token = self
            .codec
            .issue(
                &authorities.username,
                &authorities.roles,
                &authorities.permissions,
                now,
            )
            .map_err(signing_failed)?;

        tracing::info!(username, roles = authorities.roles.len(), "login succeeded");
        Ok(IssuedToken { token, expires_at })
    }

    /// Store errors propagate on the outer result; credential mismatches land
    /// in the inner one so they can be logged before collapsing. An unknown
    /// username still pays for one hash comparison.
    async fn check_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> AccessResult<Result<Authorities, AuthenticationFailure>> {
        let Some(user) = self.store.find_user_by_username(username).await? else {
            let _ = self.hasher.matches(password, &self.decoy);
            return Ok(Err(AuthenticationFailure::BadCredentials));
        };
        if !self.hasher.matches(password, &user.password) {
            return Ok(Err(AuthenticationFailure::BadCredentials));
        }

        let records = self.store.find_all_roles().await?;
        let roles: Vec<Role> = user
            .roles
            .iter()
            .map(|name| {
                records
                    .iter()
                    .find(|r| &r.name == name)
                    .cloned()
                    .unwrap_or_else(|| Role::new(name.clone()))
            })
            .collect();

        Ok(Ok(Authorities::from_role_records(user.username, &roles)))
    }

    /// Verify a presented `Authorization` header value. The authority set comes
    /// from the token's claims alone; the store is not consulted.
    pub fn authenticate_bearer(
        &self,
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> AccessResult<Authorities> {
        self.verify_bearer(header, now).map_err(|cause| {
            tracing::debug!(%cause, "bearer rejected");
            AccessError::from(cause)
        })
    }

    fn verify_bearer(
        &self,
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Authorities, AuthenticationFailure> {
        let token = extract_bearer(header)?;
        let claims = self.codec.verify(token, now)?;
        Ok(Authorities::from_claims(claims))
    }
}

impl core::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authenticator")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
