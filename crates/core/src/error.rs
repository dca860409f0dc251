//! Outward error taxonomy.
//!
//! Every failure that crosses the service boundary collapses into one of
//! these variants. Internal causes (token parse errors, store failures, ...)
//! are typed in the crates that produce them and converted here.

use thiserror::Error;

/// Result type used by account and authorization operations.
pub type AccessResult<T> = Result<T, AccessError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// Bad credentials or an unusable bearer token.
    ///
    /// The cause is deliberately not carried: callers must not be able to
    /// tell a wrong password from an expired or forged token.
    #[error("unauthorized")]
    Unauthenticated,

    /// The caller is identified but lacks the tier or permission required.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request payload violates a constraint (unknown permission code,
    /// empty role set, duplicate username, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A required user or role does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The identity store failed.
    #[error("store error: {0}")]
    Store(String),
}

impl AccessError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Stable machine-readable code, used as the `error` field of API bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::Unauthenticated => "unauthorized",
            AccessError::Forbidden(_) => "forbidden",
            AccessError::Validation(_) => "bad_request",
            AccessError::NotFound(_) => "not_found",
            AccessError::Store(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_display_carries_no_cause() {
        assert_eq!(AccessError::Unauthenticated.to_string(), "unauthorized");
    }

    #[test]
    fn constructors_keep_reason() {
        let err = AccessError::validation("at least one role must be provided");
        assert_eq!(
            err.to_string(),
            "validation failed: at least one role must be provided"
        );
        assert_eq!(err.code(), "bad_request");
        assert_eq!(AccessError::forbidden("x").code(), "forbidden");
    }
}
