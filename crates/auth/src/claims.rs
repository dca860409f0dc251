use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::permissions::Permission;
use crate::roles::RoleName;

/// Claims carried by a bearer token.
///
/// This is the wire contract between issuance and verification: subject,
/// time window, and the authority snapshot taken at issuance. Claims never
/// refresh; a role change after issuance is only visible in the next token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (username).
    pub sub: String,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,

    /// Role names held at issuance, sorted.
    pub roles: Vec<RoleName>,

    /// Permission codes held at issuance, sorted.
    pub permissions: Vec<Permission>,
}

/// Why a token was rejected.
///
/// Only logged; every variant surfaces to clients as the same unauthorized outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("signing key must not be empty")]
    EmptyKey,

    #[error("token lifetime must be between 1 ms and {max_ms} ms")]
    TtlOutOfRange { max_ms: i64 },

    #[error("failed to sign token")]
    Signing,
}

/// Deterministically validate the time window of `claims` at `now`.
///
/// Signature verification happens before this in [`crate::TokenCodec::verify`].
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(issued_at: DateTime<Utc>, ttl_ms: i64) -> TokenClaims {
        TokenClaims {
            sub: "alice".into(),
            issued_at,
            expires_at: issued_at + Duration::milliseconds(ttl_ms),
            roles: vec![RoleName::USER],
            permissions: vec![],
        }
    }

    #[test]
    fn valid_inside_window() {
        let t0 = Utc::now();
        assert_eq!(validate_claims(&claims(t0, 1000), t0), Ok(()));
        assert_eq!(
            validate_claims(&claims(t0, 1000), t0 + Duration::milliseconds(999)),
            Ok(())
        );
    }

    #[test]
    fn expiry_is_exclusive() {
        let t0 = Utc::now();
        let c = claims(t0, 1000);
        assert_eq!(
            validate_claims(&c, t0 + Duration::milliseconds(1000)),
            Err(TokenError::Expired)
        );
        assert_eq!(
            validate_claims(&c, t0 + Duration::milliseconds(1001)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn future_and_inverted_windows_rejected() {
        let t0 = Utc::now();
        assert_eq!(
            validate_claims(&claims(t0, 1000), t0 - Duration::milliseconds(1)),
            Err(TokenError::NotYetValid)
        );
        assert_eq!(
            validate_claims(&claims(t0, 0), t0),
            Err(TokenError::InvalidTimeWindow)
        );
    }
}
