//! Authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password creation rules
//! - The credential check used by login

mod password;

pub use password::{PasswordError, hash_password, validate_new_password, verify_password};

/// Stored credential for a user, as loaded from persistence.
#[derive(Debug, Clone, Copy)]
pub struct StoredCredential<'a> {
    /// PHC-formatted password hash.
    pub password_hash: &'a str,
    /// Disabled accounts never authenticate.
    pub enabled: bool,
}

/// Decides whether a login attempt succeeds.
///
/// Every failure mode collapses into `false` so callers cannot tell a
/// missing user from a wrong password. A malformed stored hash is a failed
/// attempt, not an error.
#[must_use]
pub fn authenticate(username: &str, password: &str, stored: Option<StoredCredential<'_>>) -> bool {
    if username.trim().is_empty() || password.trim().is_empty() {
        return false;
    }

    let Some(credential) = stored else {
        return false;
    };

    if !credential.enabled {
        return false;
    }

    verify_password(password, credential.password_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(hash: &str, enabled: bool) -> StoredCredential<'_> {
        StoredCredential {
            password_hash: hash,
            enabled,
        }
    }

    #[test]
    fn test_authenticate_success() {
        let hash = hash_password("hunter22").unwrap();
        assert!(authenticate("alice", "hunter22", Some(credential(&hash, true))));
    }

    #[test]
    fn test_authenticate_wrong_password() {
        let hash = hash_password("hunter22").unwrap();
        assert!(!authenticate("alice", "hunter23", Some(credential(&hash, true))));
    }

    #[test]
    fn test_authenticate_unknown_user() {
        assert!(!authenticate("ghost", "whatever", None));
    }

    #[test]
    fn test_authenticate_blank_input() {
        let hash = hash_password("hunter22").unwrap();
        assert!(!authenticate("", "hunter22", Some(credential(&hash, true))));
        assert!(!authenticate("   ", "hunter22", Some(credential(&hash, true))));
        assert!(!authenticate("alice", "", Some(credential(&hash, true))));
    }

    #[test]
    fn test_authenticate_whitespace_password_is_blank() {
        let hash = hash_password("   ").unwrap();
        assert!(!authenticate("carol", "   ", Some(credential(&hash, true))));
        assert!(!authenticate("carol", "\t\n", Some(credential(&hash, true))));
    }

    #[test]
    fn test_authenticate_disabled_user() {
        let hash = hash_password("hunter22").unwrap();
        assert!(!authenticate("alice", "hunter22", Some(credential(&hash, false))));
    }

    #[test]
    fn test_authenticate_malformed_hash_is_failure() {
        assert!(!authenticate(
            "alice",
            "hunter22",
            Some(credential("plaintext-left-in-db", true))
        ));
    }
}
