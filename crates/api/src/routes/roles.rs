//! Role and privilege catalog routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{ApiError, ApiResult, AppState, middleware::AuthUser};
use armas_core::access::RoleName;
use armas_db::CatalogRepository;
use armas_db::entities::{privileges, roles};
use armas_db::repositories::RoleWithPrivileges;
use armas_shared::AppError;

/// Creates the catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route("/privileges", get(list_privileges))
        .route("/roles/{id}/privileges", get(role_privileges))
        .route("/roles/{id}/assign-privileges", post(assign_privileges))
        .route(
            "/roles/{id}/privileges/{privilege_id}",
            patch(toggle_privilege),
        )
}

/// A role without its privileges.
#[derive(Debug, Serialize)]
pub struct RoleSummary {
    /// Role ID.
    pub id: Uuid,
    /// Role name.
    pub description: String,
}

impl From<roles::Model> for RoleSummary {
    fn from(role: roles::Model) -> Self {
        Self {
            id: role.id,
            description: role.description,
        }
    }
}

/// A privilege from the catalog.
#[derive(Debug, Serialize)]
pub struct PrivilegeResponse {
    /// Privilege ID.
    pub id: Uuid,
    /// Privilege name.
    pub description: String,
}

impl From<privileges::Model> for PrivilegeResponse {
    fn from(privilege: privileges::Model) -> Self {
        Self {
            id: privilege.id,
            description: privilege.description,
        }
    }
}

/// A privilege as linked to a role.
#[derive(Debug, Serialize)]
pub struct LinkedPrivilege {
    /// Privilege ID.
    pub id: Uuid,
    /// Privilege name.
    pub description: String,
    /// Whether the link currently grants the privilege.
    pub active: bool,
}

/// A role with its privileges.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    /// Role ID.
    pub id: Uuid,
    /// Role name.
    pub description: String,
    /// Linked privileges.
    pub privileges: Vec<LinkedPrivilege>,
}

impl From<RoleWithPrivileges> for RoleResponse {
    fn from(value: RoleWithPrivileges) -> Self {
        Self {
            id: value.role.id,
            description: value.role.description,
            privileges: value
                .privileges
                .into_iter()
                .map(|(p, active)| LinkedPrivilege {
                    id: p.id,
                    description: p.description,
                    active,
                })
                .collect(),
        }
    }
}

/// Body of `POST /roles`.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    /// Name of the new role.
    pub description: String,
}

/// Body of `POST /roles/{id}/assign-privileges`.
#[derive(Debug, Deserialize)]
pub struct AssignPrivilegesRequest {
    /// The role's complete new privilege set.
    pub privilege_ids: Vec<Uuid>,
}

/// Body of `PATCH /roles/{id}/privileges/{privilege_id}`.
#[derive(Debug, Deserialize)]
pub struct TogglePrivilegeRequest {
    /// New state of the link.
    pub active: bool,
}

/// GET /roles
async fn list_roles(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = CatalogRepository::new((*state.db).clone())
        .list_roles()
        .await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

/// GET /privileges
async fn list_privileges(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<PrivilegeResponse>>> {
    let privileges = CatalogRepository::new((*state.db).clone())
        .list_privileges()
        .await?;
    Ok(Json(
        privileges.into_iter().map(PrivilegeResponse::from).collect(),
    ))
}

/// POST /roles - Create a custom role.
async fn create_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    auth.require_role(RoleName::Admin)?;

    let role = CatalogRepository::new((*state.db).clone())
        .create_role(&payload.description)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RoleResponse {
            id: role.id,
            description: role.description,
            privileges: Vec::new(),
        }),
    ))
}

/// GET /roles/{id}/privileges
async fn role_privileges(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<RoleResponse>> {
    let role = CatalogRepository::new((*state.db).clone())
        .role_privileges(role_id)
        .await?;
    Ok(Json(role.into()))
}

/// POST /roles/{id}/assign-privileges - Replace a role's privilege set.
async fn assign_privileges(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<AssignPrivilegesRequest>,
) -> ApiResult<Json<RoleResponse>> {
    auth.require_role(RoleName::Admin)?;

    let role = CatalogRepository::new((*state.db).clone())
        .assign_privileges_to_role(role_id, &payload.privilege_ids)
        .await?;
    Ok(Json(role.into()))
}

/// PATCH /roles/{id}/privileges/{privilege_id} - Switch a role privilege on or off.
async fn toggle_privilege(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((role_id, privilege_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<TogglePrivilegeRequest>,
) -> ApiResult<StatusCode> {
    auth.require_role(RoleName::Admin)?;
    if !state.features.role_privilege_toggle {
        return Err(ApiError(AppError::NotFound(
            "role privilege toggling is disabled".into(),
        )));
    }

    CatalogRepository::new((*state.db).clone())
        .set_role_privilege_active(role_id, privilege_id, payload.active)
        .await?;

    info!(%role_id, %privilege_id, active = payload.active, toggled_by = %auth.user_id(), "role privilege updated");
    Ok(StatusCode::NO_CONTENT)
}
