//! Shared-secret authentication
//!
//! Every mutating request carries the secret verbatim in its
//! `authorization` header. The value is compared for exact equality; there
//! is no hashing, expiry or per-user credential.

use std::fmt;
use thiserror::Error;

/// Authentication failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiAuthError {
    /// No `authorization` header was sent
    #[error("Missing authorization")]
    Missing,

    /// Header present but different from the secret
    #[error("Wrong password")]
    Mismatch,
}

/// The process-wide credential, fixed at startup
///
/// `Debug` is redacted so the value never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    /// Wrap a secret; empty strings are rejected
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    pub fn matches(&self, provided: &str) -> bool {
        self.0 == provided
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(***)")
    }
}

/// Check a provided header value against the secret
pub fn validate_secret(provided: Option<&str>, secret: &SharedSecret) -> Result<(), ApiAuthError> {
    match provided {
        None => Err(ApiAuthError::Missing),
        Some(value) if secret.matches(value) => Ok(()),
        Some(_) => Err(ApiAuthError::Mismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_secret_rejected() {
        assert!(SharedSecret::new("").is_none());
    }

    #[test]
    fn test_exact_match_required() {
        let secret = SharedSecret::new("hunter2").unwrap();

        assert_eq!(validate_secret(Some("hunter2"), &secret), Ok(()));
        assert_eq!(
            validate_secret(Some("hunter2 "), &secret),
            Err(ApiAuthError::Mismatch)
        );
        assert_eq!(
            validate_secret(Some("HUNTER2"), &secret),
            Err(ApiAuthError::Mismatch)
        );
        assert_eq!(validate_secret(None, &secret), Err(ApiAuthError::Missing));
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = SharedSecret::new("hunter2").unwrap();
        assert!(!format!("{:?}", secret).contains("hunter2"));
    }
}
