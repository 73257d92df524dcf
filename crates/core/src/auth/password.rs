//! Password hashing with Argon2id.
//!
//! Uses the recommended Argon2id variant with secure defaults.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

use armas_shared::AppError;

/// Passwords that are refused outright when creating or changing credentials.
const FORBIDDEN_PASSWORDS: &[&str] = &["admin"];

/// Errors that can occur during password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Failed to hash password.
    #[error("failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password.
    #[error("failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format.
    #[error("invalid password hash format")]
    InvalidHash,

    /// The password is empty.
    #[error("password must not be empty")]
    Empty,

    /// The password is on the refused list.
    #[error("password '{0}' is not allowed")]
    Forbidden(String),
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Empty | PasswordError::Forbidden(_) => Self::Validation(err.to_string()),
            PasswordError::HashError(_)
            | PasswordError::VerifyError(_)
            | PasswordError::InvalidHash => Self::Internal(err.to_string()),
        }
    }
}

/// Checks a new password against the creation rules.
///
/// The refused list applies regardless of the role being requested.
///
/// # Errors
///
/// Returns `PasswordError::Empty` for blank input and
/// `PasswordError::Forbidden` for refused literals.
pub fn validate_new_password(password: &str) -> Result<(), PasswordError> {
    if password.trim().is_empty() {
        return Err(PasswordError::Empty);
    }
    if FORBIDDEN_PASSWORDS
        .iter()
        .any(|forbidden| password.eq_ignore_ascii_case(forbidden))
    {
        return Err(PasswordError::Forbidden(password.to_string()));
    }
    Ok(())
}

/// Hashes a password using Argon2id.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails.
///
/// # Example
///
/// ```
/// use armas_core::auth::hash_password;
///
/// let hash = hash_password("correct horse").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored PHC hash.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the hash format is invalid.
/// Returns `PasswordError::VerifyError` if verification fails unexpectedly.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cure-enough").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cure-enough", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salts() {
        let first = hash_password("password1").unwrap();
        let second = hash_password("password1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "not-a-phc-string");
        assert!(matches!(result, Err(PasswordError::InvalidHash)));
    }

    #[rstest]
    #[case("admin")]
    #[case("ADMIN")]
    #[case("Admin")]
    fn test_admin_literal_refused(#[case] password: &str) {
        assert!(matches!(
            validate_new_password(password),
            Err(PasswordError::Forbidden(_))
        ));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_blank_password_refused(#[case] password: &str) {
        assert!(matches!(
            validate_new_password(password),
            Err(PasswordError::Empty)
        ));
    }

    #[test]
    fn test_regular_password_accepted() {
        assert!(validate_new_password("administrator-2024").is_ok());
    }

    #[test]
    fn test_rule_violations_are_validation_errors() {
        let err: AppError = PasswordError::Forbidden("admin".into()).into();
        assert_eq!(err.status_code(), 400);
        let err: AppError = PasswordError::InvalidHash.into();
        assert_eq!(err.status_code(), 500);
    }
}
