//! Authentication types for JWT and login payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix that marks an authority as a role rather than a privilege.
pub const ROLE_PREFIX: &str = "ROLE_";

/// JWT claims for access tokens.
///
/// The authority list is a snapshot taken at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Username at login time.
    pub username: String,
    /// Organization the user belongs to, if any.
    pub org: Option<Uuid>,
    /// Resolved authorities (roles prefixed with `ROLE_`, privileges as-is).
    pub authorities: Vec<String>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        username: &str,
        org_id: Option<Uuid>,
        authorities: Vec<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            username: username.to_string(),
            org: org_id,
            authorities,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the organization ID from claims.
    #[must_use]
    pub const fn organization_id(&self) -> Option<Uuid> {
        self.org
    }

    /// Role names carried by the token, without the `ROLE_` prefix.
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.authorities
            .iter()
            .filter_map(|a| a.strip_prefix(ROLE_PREFIX))
    }
}

/// Login request payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// Username.
    #[serde(default)]
    pub username: String,
    /// Plaintext password.
    #[serde(default)]
    pub password: String,
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Signed bearer token.
    pub token: String,
    /// Authenticated user id.
    pub user_id: Uuid,
    /// Authenticated username.
    pub username: String,
    /// Role names held by the user.
    pub roles: Vec<String>,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Registration request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Unique username.
    pub username: String,
    /// Plaintext password.
    pub password: String,
    /// Display name.
    pub full_name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Organization affiliation.
    pub organization_id: Option<Uuid>,
    /// Directorate affiliation.
    pub directorate_id: Option<Uuid>,
    /// Requested role names; only honoured for ADMIN callers.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Password change request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password.
    pub current_password: String,
    /// Replacement password.
    pub new_password: String,
}
