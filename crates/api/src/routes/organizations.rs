//! Reference data routes: organizations, directorates, and report types.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{ApiError, ApiResult, AppState, middleware::AuthUser};
use armas_core::access::RoleName;
use armas_db::entities::{directorates, documents, organizations};
use armas_db::{DocumentRepository, OrganizationRepository};
use armas_shared::AppError;

/// Creates the reference data routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations",
            get(list_organizations).post(create_organization),
        )
        .route("/organizations/{id}", get(get_organization))
        .route("/organizations/{id}/head", put(set_head))
        .route(
            "/directorates",
            get(list_directorates).post(create_directorate),
        )
        .route("/documents", get(list_documents).post(create_document))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for an organization.
#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    /// Organization ID.
    pub id: Uuid,
    /// Unique name.
    pub name: String,
    /// Owning directorate.
    pub directorate_id: Option<Uuid>,
    /// Username of the head.
    pub organization_head: Option<String>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

impl From<organizations::Model> for OrganizationResponse {
    fn from(org: organizations::Model) -> Self {
        Self {
            id: org.id,
            name: org.name,
            directorate_id: org.directorate_id,
            organization_head: org.organization_head,
            created_at: org.created_at,
        }
    }
}

/// Response for a directorate.
#[derive(Debug, Serialize)]
pub struct DirectorateResponse {
    /// Directorate ID.
    pub id: Uuid,
    /// Unique name.
    pub name: String,
}

impl From<directorates::Model> for DirectorateResponse {
    fn from(dir: directorates::Model) -> Self {
        Self {
            id: dir.id,
            name: dir.name,
        }
    }
}

/// Response for a report type.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    /// Document ID.
    pub id: Uuid,
    /// Report type label.
    pub report_type: String,
    /// Owning directorate.
    pub directorate_id: Uuid,
}

impl From<documents::Model> for DocumentResponse {
    fn from(doc: documents::Model) -> Self {
        Self {
            id: doc.id,
            report_type: doc.report_type,
            directorate_id: doc.directorate_id,
        }
    }
}

/// Body of `POST /organizations`.
#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    /// Unique name.
    pub name: String,
    /// Owning directorate.
    pub directorate_id: Option<Uuid>,
    /// Username of the head.
    pub organization_head: Option<String>,
}

/// Body of `PUT /organizations/{id}/head`.
#[derive(Debug, Deserialize)]
pub struct SetHeadRequest {
    /// New head; `null` clears it.
    pub username: Option<String>,
}

/// Body of `POST /directorates`.
#[derive(Debug, Deserialize)]
pub struct CreateDirectorateRequest {
    /// Unique name.
    pub name: String,
}

/// Body of `POST /documents`.
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    /// Report type label.
    pub report_type: String,
    /// Owning directorate.
    pub directorate_id: Uuid,
}

/// Query parameters of `GET /documents`.
#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    /// Restrict to one directorate.
    pub directorate_id: Option<Uuid>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /organizations
async fn list_organizations(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<OrganizationResponse>>> {
    let orgs = OrganizationRepository::new((*state.db).clone())
        .list()
        .await?;
    Ok(Json(orgs.into_iter().map(OrganizationResponse::from).collect()))
}

/// GET /organizations/{id}
async fn get_organization(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<OrganizationResponse>> {
    let org = OrganizationRepository::new((*state.db).clone())
        .find_by_id(org_id)
        .await?
        .ok_or_else(|| ApiError(AppError::not_found("Organization", org_id)))?;
    Ok(Json(org.into()))
}

/// POST /organizations
async fn create_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<OrganizationResponse>)> {
    auth.require_role(RoleName::Admin)?;

    let org = OrganizationRepository::new((*state.db).clone())
        .create(
            &payload.name,
            payload.directorate_id,
            payload.organization_head,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(org.into())))
}

/// PUT /organizations/{id}/head - Set or clear the organization head.
///
/// Takes effect at the head's next login, or on the next request when
/// authorities are refreshed per request.
async fn set_head(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<SetHeadRequest>,
) -> ApiResult<Json<OrganizationResponse>> {
    auth.require_role(RoleName::Admin)?;

    let org = OrganizationRepository::new((*state.db).clone())
        .set_head(org_id, payload.username)
        .await?;
    info!(organization_id = %org_id, changed_by = %auth.user_id(), "organization head updated");
    Ok(Json(org.into()))
}

/// GET /directorates
async fn list_directorates(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<DirectorateResponse>>> {
    let dirs = OrganizationRepository::new((*state.db).clone())
        .list_directorates()
        .await?;
    Ok(Json(dirs.into_iter().map(DirectorateResponse::from).collect()))
}

/// POST /directorates
async fn create_directorate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateDirectorateRequest>,
) -> ApiResult<(StatusCode, Json<DirectorateResponse>)> {
    auth.require_role(RoleName::Admin)?;

    let dir = OrganizationRepository::new((*state.db).clone())
        .create_directorate(&payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(dir.into())))
}

/// GET /documents
async fn list_documents(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<DocumentQuery>,
) -> ApiResult<Json<Vec<DocumentResponse>>> {
    let docs = DocumentRepository::new((*state.db).clone())
        .list(query.directorate_id)
        .await?;
    Ok(Json(docs.into_iter().map(DocumentResponse::from).collect()))
}

/// POST /documents
async fn create_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateDocumentRequest>,
) -> ApiResult<(StatusCode, Json<DocumentResponse>)> {
    auth.require_role(RoleName::Admin)?;

    let doc = DocumentRepository::new((*state.db).clone())
        .create(&payload.report_type, payload.directorate_id)
        .await?;
    Ok((StatusCode::CREATED, Json(doc.into())))
}
