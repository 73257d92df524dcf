//! User account routes: registration, profile, and role/privilege administration.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    ApiError, ApiResult, AppState,
    middleware::{AuthUser, MaybeAuthUser},
    routes::roles::RoleSummary,
};
use armas_core::access::RoleName;
use armas_core::auth::{hash_password, validate_new_password, verify_password};
use armas_db::entities::users;
use armas_db::repositories::NewUser;
use armas_db::{AuthorityRepository, CatalogRepository, UserRepository};
use armas_shared::auth::{ChangePasswordRequest, RegisterRequest};
use armas_shared::{AppError, ROLE_PREFIX};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/users", post(register))
}

/// Routes behind the auth middleware.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(me))
        .route("/users/me/password", put(change_password))
        .route("/users/{id}", delete(delete_user))
        .route("/users/{id}/roles", put(assign_roles))
        .route("/users/{id}/roles/{role_id}", delete(unassign_role))
        .route("/users/{id}/privileges", post(assign_privileges))
        .route(
            "/users/{id}/privileges/{privilege_id}",
            delete(unassign_privilege),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Public view of a user account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Display name.
    pub full_name: Option<String>,
    /// Contact address.
    pub email: Option<String>,
    /// Whether the account can log in.
    pub enabled: bool,
    /// Home organization.
    pub organization_id: Option<Uuid>,
    /// Home directorate.
    pub directorate_id: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            enabled: user.enabled,
            organization_id: user.organization_id,
            directorate_id: user.directorate_id,
            created_at: user.created_at,
        }
    }
}

/// The caller's own profile.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Account details.
    #[serde(flatten)]
    pub user: UserResponse,
    /// Authorities in effect for this request.
    pub authorities: Vec<String>,
}

/// Body of `PUT /users/{id}/roles`.
#[derive(Debug, Deserialize)]
pub struct AssignRolesRequest {
    /// Roles to add.
    pub role_ids: Vec<Uuid>,
}

/// Body of `POST /users/{id}/privileges`.
#[derive(Debug, Deserialize)]
pub struct AssignPrivilegesRequest {
    /// Privileges to grant directly.
    pub privilege_ids: Vec<Uuid>,
}

fn overrides_disabled() -> ApiError {
    ApiError(AppError::NotFound(
        "user privilege overrides are disabled".into(),
    ))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /users - Register an account.
///
/// Anonymous callers always get the USER role; requested roles are only
/// honoured for administrators.
async fn register(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::validation("username is required"));
    }
    validate_new_password(&payload.password)?;

    let is_admin = caller
        .as_ref()
        .is_some_and(|c| c.has_role(RoleName::Admin));
    if !is_admin && !payload.roles.is_empty() {
        info!(%username, "ignoring roles requested by non-admin registration");
    }

    let requested: Vec<String> = if is_admin && !payload.roles.is_empty() {
        payload
            .roles
            .iter()
            .map(|r| {
                let name = r.trim();
                let name = name.strip_prefix(ROLE_PREFIX).unwrap_or(name);
                RoleName::parse(name).map_or_else(|| name.to_string(), |role| role.as_str().to_string())
            })
            .collect()
    } else {
        vec![RoleName::User.as_str().to_string()]
    };

    let catalog = CatalogRepository::new((*state.db).clone());
    let mut role_ids = Vec::with_capacity(requested.len());
    for name in &requested {
        let role = catalog
            .find_role_by_description(name)
            .await?
            .ok_or_else(|| ApiError::validation(format!("unknown role '{name}'")))?;
        role_ids.push(role.id);
    }

    let full_name = Some(payload.full_name.trim().to_string()).filter(|n| !n.is_empty());
    let user = UserRepository::new((*state.db).clone())
        .create(
            NewUser {
                username: username.to_string(),
                password_hash: hash_password(&payload.password)?,
                full_name,
                email: payload.email.filter(|e| !e.trim().is_empty()),
                organization_id: payload.organization_id,
                directorate_id: payload.directorate_id,
            },
            &role_ids,
        )
        .await?;

    info!(user_id = %user.id, roles = ?requested, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users - List all accounts.
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<UserResponse>>> {
    auth.require_role(RoleName::Admin)?;

    let users = UserRepository::new((*state.db).clone()).list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/me - The caller's profile and authorities.
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<ProfileResponse>> {
    let user = UserRepository::new((*state.db).clone())
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError(AppError::not_found("User", auth.user_id())))?;

    Ok(Json(ProfileResponse {
        user: user.into(),
        authorities: auth.claims().authorities.clone(),
    }))
}

/// PUT /users/me/password - Change the caller's password.
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    let repo = UserRepository::new((*state.db).clone());
    let user = repo
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError(AppError::not_found("User", auth.user_id())))?;

    if !verify_password(&payload.current_password, &user.password_hash).unwrap_or(false) {
        return Err(ApiError::validation("current password is incorrect"));
    }
    validate_new_password(&payload.new_password)?;

    let hash = hash_password(&payload.new_password)?;
    repo.update_password(user.id, &hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /users/{id} - Delete an account and the reports it uploaded.
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require_role(RoleName::Admin)?;

    let paths = UserRepository::new((*state.db).clone())
        .delete(user_id)
        .await?;

    let workflow = state.workflow();
    for path in &paths {
        workflow.remove_file(path).await;
    }

    info!(%user_id, deleted_by = %auth.user_id(), "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /users/{id}/roles - Add roles to a user.
async fn assign_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AssignRolesRequest>,
) -> ApiResult<Json<Vec<RoleSummary>>> {
    auth.require_role(RoleName::Admin)?;

    CatalogRepository::new((*state.db).clone())
        .assign_user_roles(user_id, &payload.role_ids)
        .await?;

    let roles = AuthorityRepository::new((*state.db).clone())
        .roles_of(user_id)
        .await?;
    Ok(Json(roles.into_iter().map(RoleSummary::from).collect()))
}

/// DELETE /users/{id}/roles/{role_id} - Remove a role from a user.
async fn unassign_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((user_id, role_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require_role(RoleName::Admin)?;

    CatalogRepository::new((*state.db).clone())
        .unassign_user_role(user_id, role_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/{id}/privileges - Grant privileges directly to a user.
async fn assign_privileges(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AssignPrivilegesRequest>,
) -> ApiResult<StatusCode> {
    auth.require_role(RoleName::Admin)?;
    if !state.features.user_privilege_overrides {
        return Err(overrides_disabled());
    }

    CatalogRepository::new((*state.db).clone())
        .assign_user_privileges(user_id, &payload.privilege_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /users/{id}/privileges/{privilege_id} - Revoke a direct grant.
async fn unassign_privilege(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((user_id, privilege_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    auth.require_role(RoleName::Admin)?;
    if !state.features.user_privilege_overrides {
        return Err(overrides_disabled());
    }

    CatalogRepository::new((*state.db).clone())
        .unassign_user_privilege(user_id, privilege_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
