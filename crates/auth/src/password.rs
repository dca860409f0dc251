//! Password hashing collaborator.
//!
//! The core only needs `hash` and `matches`; the Argon2id implementation
//! below is what the service wires in.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use thiserror::Error;

/// One-way password hash in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wrap a hash previously produced by a [`CredentialHasher`] (e.g. loaded from the store).
    pub fn from_stored(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("HashedPassword([REDACTED])")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("failed to hash password")]
    Hash,
}

/// Hash/compare contract consumed by the authentication pipeline.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<HashedPassword, HashError>;

    /// A malformed stored hash never matches.
    fn matches(&self, plaintext: &str, hashed: &HashedPassword) -> bool;
}

/// Argon2id hasher.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<HashedPassword, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        argon2_instance()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| HashedPassword(hash.to_string()))
            .map_err(|_| HashError::Hash)
    }

    fn matches(&self, plaintext: &str, hashed: &HashedPassword) -> bool {
        let Ok(parsed) = PasswordHash::new(hashed.as_str()) else {
            return false;
        };
        argon2_instance()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Argon2id with library defaults; test builds use minimal cost parameters.
fn argon2_instance() -> Argon2<'static> {
    #[cfg(test)]
    {
        use argon2::{Algorithm, Params, Version};
        match Params::new(1024, 1, 1, None) {
            Ok(params) => Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            Err(_) => Argon2::default(),
        }
    }

    #[cfg(not(test))]
    {
        Argon2::default()
    }
}
