//! HS256 token codec.
//!
//! The signing key is loaded once and held only inside the codec. Its `Debug`
//! output never includes key material.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};

use crate::claims::{TokenClaims, TokenError, validate_claims};
use crate::permissions::Permission;
use crate::roles::RoleName;

/// Longest accepted token lifetime: 365 days.
pub const MAX_TTL_MS: i64 = 365 * 24 * 60 * 60 * 1000;

/// Signs and verifies bearer tokens.
///
/// Stateless and `Sync`; share one instance behind an `Arc` across all request tasks.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptyKey);
        }
        if ttl <= Duration::zero() || ttl > Duration::milliseconds(MAX_TTL_MS) {
            return Err(TokenError::TtlOutOfRange { max_ms: MAX_TTL_MS });
        }

        // Time checks run against the caller-supplied `now` in `verify`, so the
        // library's wall-clock `exp` handling is switched off.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    /// `now + ttl`, or `InvalidTimeWindow` when that leaves chrono's range.
    pub fn expiry_for(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, TokenError> {
        now.checked_add_signed(self.ttl)
            .ok_or(TokenError::InvalidTimeWindow)
    }

    /// Mint a token for `subject` valid from `now` until `now + ttl`.
    pub fn issue<'a>(
        &self,
        subject: &str,
        roles: impl IntoIterator<Item = &'a RoleName>,
        permissions: impl IntoIterator<Item = &'a Permission>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let mut roles: Vec<RoleName> = roles.into_iter().cloned().collect();
        roles.sort();
        roles.dedup();
        let mut permissions: Vec<Permission> = permissions.into_iter().cloned().collect();
        permissions.sort();
        permissions.dedup();

        let claims = TokenClaims {
            sub: subject.to_string(),
            issued_at: now,
            expires_at: self.expiry_for(now)?,
            roles,
            permissions,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Signing)
    }

    /// Check signature and time window, returning the embedded claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
                _ => TokenError::Malformed,
            }
        })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &"HS256")
            .field("ttl_ms", &self.ttl.num_milliseconds())
            .finish_non_exhaustive()
    }
}
