//! # Auth Errors
//!
//! Error types for registration, login and token handling.

use thiserror::Error;
use tracing::error;

use crate::api::ErrorSignal;
use crate::storage::StorageError;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Message for a duplicate registration
pub const EMAIL_IN_USE_MESSAGE: &str =
    "Email already in use, please use a different email address.";

/// Message for any failed login (don't leak whether the email exists)
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    // ==================
    // Request Errors
    // ==================
    /// Payload failed schema or format validation
    #[error("{0}")]
    Validation(ErrorSignal),

    /// Email already registered
    #[error("Email already registered")]
    EmailAlreadyExists,

    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    // ==================
    // Token Errors
    // ==================
    /// JWT token is malformed
    #[error("Malformed token")]
    MalformedToken,

    /// JWT token has expired
    #[error("Token expired")]
    TokenExpired,

    /// JWT signature is invalid
    #[error("Invalid token signature")]
    InvalidSignature,

    // ==================
    // Internal Errors
    // ==================
    /// Password hashing failed
    #[error("Internal error: password hashing failed")]
    HashingFailed,

    /// Token generation failed
    #[error("Internal error: token generation failed")]
    TokenGenerationFailed,

    /// A stored user document could not be decoded
    #[error("Internal error: stored user is unreadable: {0}")]
    CorruptRecord(String),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::Validation(signal) => signal.effective_status_code(),

            // 401 Unauthorized
            AuthError::InvalidCredentials => 401,
            AuthError::MalformedToken => 401,
            AuthError::TokenExpired => 401,
            AuthError::InvalidSignature => 401,

            // 409 Conflict
            AuthError::EmailAlreadyExists => 409,
            AuthError::Storage(StorageError::DuplicateKey { .. }) => 409,

            // 500 Internal Server Error
            AuthError::HashingFailed => 500,
            AuthError::TokenGenerationFailed => 500,
            AuthError::CorruptRecord(_) => 500,
            AuthError::Storage(_) => 500,
        }
    }

    /// Returns whether this error should be logged at warn level
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<ErrorSignal> for AuthError {
    fn from(signal: ErrorSignal) -> Self {
        AuthError::Validation(signal)
    }
}

impl From<AuthError> for ErrorSignal {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(signal) => signal,
            // The store's unique index is the source of truth for duplicates
            AuthError::EmailAlreadyExists
            | AuthError::Storage(StorageError::DuplicateKey { .. }) => {
                ErrorSignal::conflict(EMAIL_IN_USE_MESSAGE)
            }
            AuthError::InvalidCredentials => ErrorSignal::unauthorized(INVALID_CREDENTIALS_MESSAGE),
            token_error @ (AuthError::MalformedToken
            | AuthError::TokenExpired
            | AuthError::InvalidSignature) => ErrorSignal::unauthorized(token_error.to_string()),
            AuthError::Storage(storage) => ErrorSignal::from(storage),
            internal => {
                error!(error = %internal, "auth failure");
                ErrorSignal::unexpected()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::EmailAlreadyExists.status_code(), 409);
        assert_eq!(AuthError::HashingFailed.status_code(), 500);
        assert_eq!(
            AuthError::Validation(ErrorSignal::bad_request("x")).status_code(),
            400
        );
    }

    #[test]
    fn test_duplicate_key_is_email_conflict() {
        let err = AuthError::Storage(StorageError::DuplicateKey {
            collection: "users".to_string(),
            field: "email".to_string(),
            value: "a@b.co".to_string(),
        });
        assert!(err.is_client_error());

        let signal = ErrorSignal::from(err);
        assert_eq!(signal.status_code(), 409);
        assert_eq!(signal.message(), EMAIL_IN_USE_MESSAGE);
    }

    #[test]
    fn test_error_messages_do_not_leak_info() {
        let signal = ErrorSignal::from(AuthError::InvalidCredentials);
        assert_eq!(signal.status_code(), 401);
        assert_eq!(signal.message(), INVALID_CREDENTIALS_MESSAGE);

        let signal = ErrorSignal::from(AuthError::CorruptRecord("missing hash".to_string()));
        assert_eq!(signal, ErrorSignal::unexpected());
    }
}
