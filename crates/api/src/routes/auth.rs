//! Authentication routes for login and logout.

use axum::{Json, Router, extract::State, routing::post};
use serde_json::{Value, json};
use tracing::info;

use crate::{ApiError, ApiResult, AppState};
use armas_core::auth::{StoredCredential, authenticate};
use armas_db::{AuthorityRepository, UserRepository};
use armas_shared::auth::{LoginRequest, LoginResponse};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid username or password")
}

/// POST /login - Authenticate and return a token carrying the caller's authorities.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.trim().is_empty() {
        return Err(invalid_credentials());
    }

    let user = UserRepository::new((*state.db).clone())
        .find_by_username(username)
        .await?;

    let credential = user.as_ref().map(|u| StoredCredential {
        password_hash: &u.password_hash,
        enabled: u.enabled,
    });
    if !authenticate(username, &payload.password, credential) {
        info!(%username, "failed login attempt");
        return Err(invalid_credentials());
    }
    let Some(user) = user else {
        return Err(invalid_credentials());
    };

    let authorities = AuthorityRepository::new((*state.db).clone())
        .resolve(&user, state.features.user_privilege_overrides)
        .await?;
    let roles = authorities.role_names();

    let token = state
        .jwt_service
        .generate_access_token(
            user.id,
            &user.username,
            user.organization_id,
            authorities.into_vec(),
        )
        .map_err(|e| ApiError(e.into()))?;

    info!(user_id = %user.id, "user logged in");

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
        roles,
        expires_in: state.jwt_service.access_token_expires_in(),
    }))
}

/// POST /logout - Acknowledge a logout. Tokens are stateless and simply expire.
async fn logout() -> Json<Value> {
    Json(json!({ "message": "Logged out" }))
}
