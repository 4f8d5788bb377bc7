//! # Password Hashing
//!
//! Passwords are only ever stored as Argon2id PHC strings with a random
//! salt. Verification is constant-time inside the argon2 crate.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::errors::{AuthError, AuthResult};

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::HashingFailed)
}

/// Verify a password against its hash
///
/// An unparseable stored hash is reported as a corrupt record, not as a
/// credential mismatch.
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AuthError::CorruptRecord(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
