//! Report transaction routes: upload, workflow transitions, and queries.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    routing::{get, post, put},
};
use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{ApiError, ApiResult, AppState, middleware::AuthUser};
use armas_core::access::RoleName;
use armas_core::workflow::{
    ReportStatus, SENT_REPORT_ROLES, STAFF_ROLES, UploadRequest, WorkflowService,
};
use armas_db::entities::master_transactions;
use armas_db::repositories::SentReport;
use armas_shared::AppError;

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/master-transactions", post(upload))
        .route("/transactions", get(list_by_status))
        .route("/transactions/assigned", get(list_assigned))
        .route("/transactions/sent-reports", get(sent_reports))
        .route("/transactions/report-type", get(list_by_report_type))
        .route(
            "/transactions/organization/{org_id}",
            get(list_by_organization),
        )
        .route("/transactions/assign/{id}", put(assign))
        .route("/transactions/submit-findings/{id}", put(submit_findings))
        .route("/transactions/approve/{id}", put(approve))
        .route("/transactions/reject/{id}", put(reject))
        .route(
            "/transactions/{id}",
            get(get_transaction).delete(delete_transaction),
        )
        .route("/transactions/{id}/file", get(download))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for a report transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Original filename.
    pub document_name: String,
    /// Current status.
    pub report_status: ReportStatus,
    /// Latest remarks.
    pub remarks: Option<String>,
    /// Fiscal year label.
    pub fiscal_year: String,
    /// Category label.
    pub report_category: String,
    /// Uploading organization.
    pub organization_id: Uuid,
    /// Report type.
    pub document_id: Uuid,
    /// Uploader.
    pub uploaded_by: Uuid,
    /// Current assignee.
    pub assigned_to: Option<Uuid>,
    /// Reviewer who submitted findings.
    pub submitted_by_auditor: Option<Uuid>,
    /// Approver who decided.
    pub decided_by: Option<Uuid>,
    /// Concurrency version.
    pub version: i32,
    /// Upload time.
    pub created_at: DateTime<FixedOffset>,
    /// Last transition time.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<master_transactions::Model> for TransactionResponse {
    fn from(m: master_transactions::Model) -> Self {
        Self {
            id: m.id,
            document_name: m.document_name,
            report_status: m.report_status.into(),
            remarks: m.remarks,
            fiscal_year: m.fiscal_year,
            report_category: m.report_category,
            organization_id: m.organization_id,
            document_id: m.document_id,
            uploaded_by: m.uploaded_by,
            assigned_to: m.assigned_to,
            submitted_by_auditor: m.submitted_by_auditor,
            decided_by: m.decided_by,
            version: m.version,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Body of `PUT /transactions/assign/{id}`.
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    /// Reviewer or approver to route the report to.
    pub assigned_to: Uuid,
}

/// Body of the findings and decision endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RemarksRequest {
    /// Findings or decision remarks.
    #[serde(default)]
    pub remarks: Option<String>,
}

/// `?status=A,B` filter.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    /// Comma-separated statuses; absent means all.
    pub status: Option<String>,
}

/// Query parameters of `GET /transactions/report-type`.
#[derive(Debug, Deserialize)]
pub struct ReportTypeQuery {
    /// Report type.
    pub document_id: Uuid,
    /// Fiscal year label.
    pub fiscal_year: Option<String>,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_statuses(query: &StatusQuery) -> ApiResult<Vec<ReportStatus>> {
    query
        .status
        .as_deref()
        .map_or_else(|| Ok(Vec::new()), ReportStatus::parse_list)
        .map_err(|token| ApiError::validation(format!("unknown report status '{token}'")))
}

fn to_responses(models: Vec<master_transactions::Model>) -> Vec<TransactionResponse> {
    models.into_iter().map(TransactionResponse::from).collect()
}

/// Header-safe rendition of a stored filename.
fn attachment_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn load_visible(
    state: &AppState,
    auth: &AuthUser,
    transaction_id: Uuid,
) -> ApiResult<master_transactions::Model> {
    let model = state
        .workflow()
        .find_by_id(transaction_id)
        .await?
        .ok_or_else(|| ApiError(AppError::not_found("Transaction", transaction_id)))?;

    if !WorkflowService::can_view(&auth.actor(), model.uploaded_by, model.assigned_to) {
        return Err(ApiError::forbidden("not allowed to view this report"));
    }
    Ok(model)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /master-transactions - Upload a report.
///
/// Multipart parts: `transaction` (JSON metadata) and `file`.
async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<TransactionResponse>)> {
    let mut request = UploadRequest::default();
    let mut file: (Option<String>, Bytes) = (None, Bytes::new());

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("transaction") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("unreadable transaction part: {e}")))?;
                request = serde_json::from_str(&text).map_err(|e| {
                    ApiError::validation(format!("invalid transaction metadata: {e}"))
                })?;
            }
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("unreadable file part: {e}")))?;
                file = (filename, data);
            }
            _ => {}
        }
    }

    let (filename, data) = file;
    let size = u64::try_from(data.len()).unwrap_or(u64::MAX);
    let validated = WorkflowService::validate_upload(
        &request,
        filename.as_deref(),
        size,
        state.storage.max_file_size(),
    )?;

    let model = state.workflow().upload(auth.user_id(), validated, data).await?;
    Ok((StatusCode::CREATED, Json(model.into())))
}

/// GET /transactions/{id}
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<Json<TransactionResponse>> {
    let model = load_visible(&state, &auth, transaction_id).await?;
    Ok(Json(model.into()))
}

/// GET /transactions/{id}/file - Download the stored report.
async fn download(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<([(header::HeaderName, String); 2], Vec<u8>)> {
    let model = load_visible(&state, &auth, transaction_id).await?;
    let data = state.workflow().read_file(&model).await?;

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                attachment_filename(&model.document_name)
            ),
        ),
    ];
    Ok((headers, data))
}

/// DELETE /transactions/{id}
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require_role(RoleName::Admin)?;

    state.workflow().delete(transaction_id).await?;
    info!(%transaction_id, deleted_by = %auth.user_id(), "transaction deleted via API");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /transactions/assign/{id}
async fn assign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> ApiResult<Json<TransactionResponse>> {
    auth.require_role(RoleName::Archiver)?;

    let model = state
        .workflow()
        .assign(transaction_id, &auth.actor(), payload.assigned_to)
        .await?;
    Ok(Json(model.into()))
}

/// PUT /transactions/submit-findings/{id}
async fn submit_findings(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<RemarksRequest>,
) -> ApiResult<Json<TransactionResponse>> {
    auth.require_role(RoleName::SeniorAuditor)?;

    let model = state
        .workflow()
        .submit_findings(transaction_id, &auth.actor(), payload.remarks.as_deref())
        .await?;
    Ok(Json(model.into()))
}

/// PUT /transactions/approve/{id}
async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<RemarksRequest>,
) -> ApiResult<Json<TransactionResponse>> {
    auth.require_role(RoleName::Approver)?;

    let model = state
        .workflow()
        .approve(transaction_id, &auth.actor(), payload.remarks.as_deref())
        .await?;
    Ok(Json(model.into()))
}

/// PUT /transactions/reject/{id}
async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<RemarksRequest>,
) -> ApiResult<Json<TransactionResponse>> {
    auth.require_role(RoleName::Approver)?;

    let model = state
        .workflow()
        .reject(transaction_id, &auth.actor(), payload.remarks.as_deref())
        .await?;
    Ok(Json(model.into()))
}

/// GET /transactions?status=A,B
async fn list_by_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    auth.require_any_role(STAFF_ROLES)?;
    let statuses = parse_statuses(&query)?;

    let models = state.workflow().list_by_statuses(&statuses).await?;
    Ok(Json(to_responses(models)))
}

/// GET /transactions/sent-reports?status=A,B
async fn sent_reports(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Vec<SentReport>>> {
    auth.require_any_role(SENT_REPORT_ROLES)?;
    let statuses = parse_statuses(&query)?;

    let rows = state.workflow().sent_reports(&statuses).await?;
    Ok(Json(rows))
}

/// GET /transactions/assigned - The caller's review queue.
async fn list_assigned(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    let models = state.workflow().list_assigned_to(auth.user_id()).await?;
    Ok(Json(to_responses(models)))
}

/// GET /transactions/organization/{org_id}
async fn list_by_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    if !WorkflowService::can_view_organization(&auth.actor(), auth.organization_id(), org_id) {
        return Err(ApiError::forbidden(
            "not allowed to view this organization's reports",
        ));
    }

    let models = state.workflow().list_by_organization(org_id).await?;
    Ok(Json(to_responses(models)))
}

/// GET /transactions/report-type?document_id=&fiscal_year=
async fn list_by_report_type(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ReportTypeQuery>,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    auth.require_any_role(STAFF_ROLES)?;

    let fiscal_year = query
        .fiscal_year
        .as_deref()
        .map(str::trim)
        .filter(|y| !y.is_empty());
    let models = state
        .workflow()
        .list_by_report_type(query.document_id, fiscal_year)
        .await?;
    Ok(Json(to_responses(models)))
}
