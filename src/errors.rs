//! Authentication error types.

use thiserror::Error;

use crate::token::TokenError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Guard or backend configuration is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed caller arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No record matched the lookup constraints
    #[error("User record not found")]
    NotFound,

    /// Password verification failed
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Public merge of `NotFound` and `InvalidCredentials`
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Filtered payload lacks the guard's identity field
    #[error("Payload missing identity field `{0}`")]
    MissingIdentity(String),

    /// No valid bearer token for the active guard
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Token backend error
    #[error("Token backend error: {0}")]
    Backend(#[from] TokenError),

    /// Record store error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,
}

impl AuthError {
    /// Whether this error propagates regardless of the session's fail mode.
    ///
    /// Configuration problems, store I/O failures, and hashing faults are
    /// operational failures, not authentication outcomes, so the soft-fail
    /// sentinel never absorbs them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AuthError::Configuration(_)
                | AuthError::Backend(TokenError::Configuration(_))
                | AuthError::Database(_)
                | AuthError::HashingFailed
        )
    }

    /// Map internal error kinds to what the caller is allowed to see.
    ///
    /// `NotFound` and `InvalidCredentials` both surface as
    /// `AuthenticationFailed` so a response cannot reveal whether the
    /// account exists. The distinct kinds are still logged internally.
    pub fn into_public(self) -> AuthError {
        match self {
            AuthError::NotFound | AuthError::InvalidCredentials => {
                AuthError::AuthenticationFailed
            }
            other => other,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Store and token-codec errors are sanitized to prevent information
    /// disclosure about the internal system structure.
    pub fn client_message(&self) -> String {
        match self {
            // Sanitize database errors - don't expose SQL details
            AuthError::Database(_) => "Internal server error".to_string(),
            // Sanitize token backend errors - don't expose codec structure
            AuthError::Backend(_) => "Authentication failed".to_string(),
            // Never confirm which lookup sub-case occurred
            AuthError::NotFound | AuthError::InvalidCredentials => {
                "Authentication failed".to_string()
            }
            // All other errors are safe to expose
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_failures_merge_at_public_boundary() {
        assert!(matches!(
            AuthError::NotFound.into_public(),
            AuthError::AuthenticationFailed
        ));
        assert!(matches!(
            AuthError::InvalidCredentials.into_public(),
            AuthError::AuthenticationFailed
        ));
        assert!(matches!(
            AuthError::Unauthenticated.into_public(),
            AuthError::Unauthenticated
        ));
    }

    #[test]
    fn test_configuration_errors_are_fatal() {
        assert!(AuthError::Configuration("missing guard".to_string()).is_fatal());
        assert!(AuthError::HashingFailed.is_fatal());
        assert!(!AuthError::NotFound.is_fatal());
        assert!(!AuthError::Unauthenticated.is_fatal());
        assert!(!AuthError::Backend(TokenError::Expired).is_fatal());
    }

    #[test]
    fn test_client_message_never_names_the_lookup_sub_case() {
        assert_eq!(AuthError::NotFound.client_message(), "Authentication failed");
        assert_eq!(
            AuthError::InvalidCredentials.client_message(),
            "Authentication failed"
        );
    }
}
