//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{AppState, error::ApiError};
use armas_core::access::{AuthoritySet, RoleName};
use armas_core::workflow::Actor;
use armas_db::AuthorityRepository;
use armas_shared::{AppError, Claims};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
}

/// Validates a token and, when configured, swaps the token's authority
/// snapshot for the user's current authorities.
async fn authenticate_token(state: &AppState, token: &str) -> Result<Claims, ApiError> {
    let mut claims = state
        .jwt_service
        .validate_token(token)
        .map_err(|e| ApiError(e.into()))?;

    if state.refresh_authorities {
        let resolved = AuthorityRepository::new((*state.db).clone())
            .resolve_by_id(claims.user_id(), state.features.user_privilege_overrides)
            .await?;
        let Some(authorities) = resolved else {
            warn!(user_id = %claims.user_id(), "token presented for missing or disabled user");
            return Err(ApiError::unauthorized("Account is no longer active"));
        };
        claims.authorities = authorities.into_vec();
    }

    Ok(claims)
}

/// Authentication middleware that validates JWT tokens.
///
/// Stores the validated claims in request extensions for `AuthUser`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return ApiError::unauthorized("Authorization header with Bearer token is required")
            .into_response();
    };

    match authenticate_token(&state, token).await {
        Ok(claims) => {
            debug!(user_id = %claims.user_id(), "request authenticated");
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extractor for authenticated user claims.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> ApiResult<Json<Profile>> {
///     auth.require_role(RoleName::Admin)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.0.user_id()
    }

    /// Returns the organization ID from the claims.
    #[must_use]
    pub const fn organization_id(&self) -> Option<Uuid> {
        self.0.organization_id()
    }

    /// Returns the inner claims.
    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.0
    }

    /// The caller's authorities.
    #[must_use]
    pub fn authorities(&self) -> AuthoritySet {
        self.0.authorities.iter().map(String::as_str).collect()
    }

    /// The caller as a workflow actor.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id(),
            authorities: self.authorities(),
        }
    }

    /// Returns true if the caller holds `role`.
    #[must_use]
    pub fn has_role(&self, role: RoleName) -> bool {
        self.0.authorities.iter().any(|a| *a == role.authority())
    }

    /// Fails with 403 unless the caller holds `role`.
    pub fn require_role(&self, role: RoleName) -> Result<(), ApiError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("{role} role required")))
        }
    }

    /// Fails with 403 unless the caller holds one of `roles`.
    pub fn require_any_role(&self, roles: &[RoleName]) -> Result<(), ApiError> {
        if roles.iter().any(|role| self.has_role(*role)) {
            Ok(())
        } else {
            Err(ApiError::forbidden("insufficient role for this operation"))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError(AppError::Unauthorized("Authentication required".into())))
    }
}

/// Claims of the caller on routes that accept anonymous requests.
///
/// A missing header yields `None`; a header carrying an invalid token is
/// still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(Self(Some(AuthUser(claims.clone()))));
        }
        match bearer_token(&parts.headers) {
            Some(token) => {
                let claims = authenticate_token(state, token).await?;
                Ok(Self(Some(AuthUser(claims))))
            }
            None => Ok(Self(None)),
        }
    }
}
