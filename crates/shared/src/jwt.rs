//! JWT token generation and validation.
//!
//! Tokens are stateless: there is no revocation list, so logging out is the
//! client's responsibility and tokens stay valid until they expire.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expires_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_token_expires_secs: 3600,
        }
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingError(msg) => Self::Internal(msg),
            JwtError::Expired => Self::Unauthorized("Token has expired".to_string()),
            JwtError::DecodingError(_) => {
                Self::Unauthorized("Invalid or malformed token".to_string())
            }
        }
    }
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expires_secs", &self.config.access_token_expires_secs)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issues an access token carrying the given authority snapshot.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        username: &str,
        org_id: Option<Uuid>,
        authorities: Vec<String>,
    ) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::seconds(self.config.access_token_expires_secs);
        let claims = Claims::new(user_id, username, org_id, authorities, expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` if the token is malformed or forged.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }

    /// Returns the access token expiration in seconds.
    #[must_use]
    pub const fn access_token_expires_in(&self) -> i64 {
        self.config.access_token_expires_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_secs: 900,
        })
    }

    #[test]
    fn test_generate_and_validate_token() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let authorities = vec!["ROLE_ARCHIVER".to_string(), "ASSIGN_REPORTS".to_string()];

        let token = service
            .generate_access_token(user_id, "dan", Some(org_id), authorities.clone())
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.organization_id(), Some(org_id));
        assert_eq!(claims.username, "dan");
        assert_eq!(claims.authorities, authorities);
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();
        let result = service.validate_token("invalid.token.here");
        assert!(matches!(result, Err(JwtError::DecodingError(_))));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let other = JwtService::new(JwtConfig {
            secret: "another-secret".to_string(),
            access_token_expires_secs: 900,
        });
        let token = other
            .generate_access_token(Uuid::new_v4(), "mallory", None, vec![])
            .unwrap();

        assert!(create_test_service().validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_secs: -600,
        });
        let token = service
            .generate_access_token(Uuid::new_v4(), "erin", None, vec![])
            .unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_jwt_errors_map_to_unauthorized() {
        assert_eq!(AppError::from(JwtError::Expired).status_code(), 401);
        assert_eq!(
            AppError::from(JwtError::DecodingError("bad".into())).status_code(),
            401
        );
        assert_eq!(
            AppError::from(JwtError::EncodingError("bad".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_expires_in_seconds() {
        assert_eq!(create_test_service().access_token_expires_in(), 900);
    }

    #[test]
    fn test_sub_minute_lifetime_is_kept() {
        let service = JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_secs: 90,
        });
        let token = service
            .generate_access_token(Uuid::new_v4(), "frank", None, vec![])
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert!((89..=90).contains(&(claims.exp - claims.iat)));
        assert_eq!(service.access_token_expires_in(), 90);
    }
}
