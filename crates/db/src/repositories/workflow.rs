//! Workflow repository for report uploads and state transitions.
//!
//! Every transition reads the row, asks `WorkflowService` for the action,
//! and writes it back guarded by the row's `version`, all inside one
//! database transaction. Notifications are stored after commit and their
//! failure is only logged.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use armas_core::storage::StorageService;
use armas_core::workflow::{
    Actor, NotificationDraft, ReportState, ReportStatus as CoreReportStatus, ValidatedUpload,
    WorkflowAction, WorkflowError, WorkflowService,
};

use super::{AuthorityRepository, NotificationRepository};
use crate::entities::{
    documents, master_transactions, organizations, sea_orm_active_enums::ReportStatus,
};

/// Row of the sent-reports projection.
#[derive(Debug, Clone, Serialize)]
pub struct SentReport {
    /// Transaction id.
    pub id: Uuid,
    /// Name of the uploading organization.
    pub organization_name: String,
    /// Report type label.
    pub report_type: String,
    /// Fiscal year label.
    pub fiscal_year: String,
    /// Upload time.
    pub created_at: DateTime<FixedOffset>,
    /// Original filename.
    pub document_name: String,
    /// Current status.
    pub report_status: CoreReportStatus,
}

/// Workflow repository for report transactions.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
    storage: StorageService,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, storage: StorageService) -> Self {
        Self { db, storage }
    }

    /// Records an upload and stores its file.
    ///
    /// The row is inserted first inside a transaction. If the file write
    /// fails the transaction is rolled back; if the commit fails the file is
    /// removed. Either way no row points at a missing file.
    ///
    /// # Errors
    ///
    /// * `ReferenceNotFound` for an unknown organization or document
    /// * `Storage` if the file cannot be written
    /// * `Database` if the insert or commit fails
    pub async fn upload(
        &self,
        uploaded_by: Uuid,
        upload: ValidatedUpload,
        data: Bytes,
    ) -> Result<master_transactions::Model, WorkflowError> {
        let txn = self.db.begin().await.map_err(db)?;

        organizations::Entity::find_by_id(upload.organization_id)
            .one(&txn)
            .await
            .map_err(db)?
            .ok_or(WorkflowError::ReferenceNotFound {
                entity: "Organization",
                id: upload.organization_id,
            })?;
        documents::Entity::find_by_id(upload.document_id)
            .one(&txn)
            .await
            .map_err(db)?
            .ok_or(WorkflowError::ReferenceNotFound {
                entity: "Document",
                id: upload.document_id,
            })?;

        let id = Uuid::new_v4();
        let key = StorageService::storage_key(upload.organization_id, id, &upload.document_name);
        let now = Utc::now().into();

        let model = master_transactions::ActiveModel {
            id: Set(id),
            document_name: Set(upload.document_name),
            storage_path: Set(key.clone()),
            report_status: Set(ReportStatus::Uploaded),
            remarks: Set(upload.remarks),
            fiscal_year: Set(upload.fiscal_year),
            report_category: Set(upload.report_category),
            organization_id: Set(upload.organization_id),
            document_id: Set(upload.document_id),
            uploaded_by: Set(uploaded_by),
            assigned_to: Set(None),
            submitted_by_auditor: Set(None),
            decided_by: Set(None),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db)?;

        if let Err(e) = self.storage.write(&key, data).await {
            if let Err(rollback) = txn.rollback().await {
                tracing::error!(transaction_id = %id, error = %rollback, "rollback after failed write");
            }
            tracing::warn!(transaction_id = %id, error = %e, "report file write failed");
            return Err(WorkflowError::Storage(e.to_string()));
        }

        if let Err(e) = txn.commit().await {
            if let Err(cleanup) = self.storage.delete(&key).await {
                tracing::error!(key = %key, error = %cleanup, "orphaned report file");
            }
            return Err(db(e));
        }

        tracing::info!(
            transaction_id = %model.id,
            organization_id = %model.organization_id,
            %uploaded_by,
            "report uploaded"
        );
        Ok(model)
    }

    /// Finds a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<master_transactions::Model>, DbErr> {
        master_transactions::Entity::find_by_id(id).one(&self.db).await
    }

    /// Reads the stored file of a transaction.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the file cannot be read.
    pub async fn read_file(&self, model: &master_transactions::Model) -> Result<Vec<u8>, WorkflowError> {
        self.storage
            .read(&model.storage_path)
            .await
            .map_err(|e| WorkflowError::Storage(e.to_string()))
    }

    /// Routes an unassigned report to a reviewer or approver.
    ///
    /// # Errors
    ///
    /// See `WorkflowService::assign`; also `TransactionNotFound` and
    /// `ConcurrentModification`.
    pub async fn assign(
        &self,
        transaction_id: Uuid,
        actor: &Actor,
        assignee_id: Uuid,
    ) -> Result<master_transactions::Model, WorkflowError> {
        let assignee_roles = AuthorityRepository::new(self.db.clone())
            .role_names_of(assignee_id)
            .await
            .map_err(db)?;

        self.transition(transaction_id, |state| {
            WorkflowService::assign(state, actor, assignee_id, assignee_roles.as_deref())
        })
        .await
    }

    /// Records reviewer findings.
    ///
    /// # Errors
    ///
    /// See `WorkflowService::submit_findings`.
    pub async fn submit_findings(
        &self,
        transaction_id: Uuid,
        actor: &Actor,
        remarks: Option<&str>,
    ) -> Result<master_transactions::Model, WorkflowError> {
        self.transition(transaction_id, |state| {
            WorkflowService::submit_findings(state, actor, remarks)
        })
        .await
    }

    /// Approves a report.
    ///
    /// # Errors
    ///
    /// See `WorkflowService::approve`.
    pub async fn approve(
        &self,
        transaction_id: Uuid,
        actor: &Actor,
        remarks: Option<&str>,
    ) -> Result<master_transactions::Model, WorkflowError> {
        self.transition(transaction_id, |state| {
            WorkflowService::approve(state, actor, remarks)
        })
        .await
    }

    /// Rejects a report.
    ///
    /// # Errors
    ///
    /// See `WorkflowService::reject`.
    pub async fn reject(
        &self,
        transaction_id: Uuid,
        actor: &Actor,
        remarks: Option<&str>,
    ) -> Result<master_transactions::Model, WorkflowError> {
        self.transition(transaction_id, |state| {
            WorkflowService::reject(state, actor, remarks)
        })
        .await
    }

    /// Deletes a transaction and then, best-effort, its file.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` for an unknown id.
    pub async fn delete(&self, transaction_id: Uuid) -> Result<master_transactions::Model, WorkflowError> {
        let model = self
            .find_by_id(transaction_id)
            .await
            .map_err(db)?
            .ok_or(WorkflowError::TransactionNotFound(transaction_id))?;

        model.clone().delete(&self.db).await.map_err(db)?;
        self.remove_file(&model.storage_path).await;

        tracing::info!(%transaction_id, "transaction deleted");
        Ok(model)
    }

    /// Removes a stored file, logging instead of failing.
    pub async fn remove_file(&self, storage_path: &str) {
        if let Err(e) = self.storage.delete(storage_path).await {
            tracing::warn!(key = %storage_path, error = %e, "failed to delete report file");
        }
    }

    /// Lists an organization's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<master_transactions::Model>, DbErr> {
        master_transactions::Entity::find()
            .filter(master_transactions::Column::OrganizationId.eq(organization_id))
            .order_by_desc(master_transactions::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Lists transactions currently assigned to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_assigned_to(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<master_transactions::Model>, DbErr> {
        master_transactions::Entity::find()
            .filter(master_transactions::Column::AssignedTo.eq(user_id))
            .order_by_desc(master_transactions::Column::UpdatedAt)
            .all(&self.db)
            .await
    }

    /// Lists transactions in any of `statuses`; all of them when empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_statuses(
        &self,
        statuses: &[CoreReportStatus],
    ) -> Result<Vec<master_transactions::Model>, DbErr> {
        let mut query =
            master_transactions::Entity::find().order_by_desc(master_transactions::Column::CreatedAt);
        if !statuses.is_empty() {
            query = query.filter(
                master_transactions::Column::ReportStatus
                    .is_in(statuses.iter().map(|s| ReportStatus::from(*s))),
            );
        }
        query.all(&self.db).await
    }

    /// Lists transactions of one report type, optionally for one fiscal year.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_report_type(
        &self,
        document_id: Uuid,
        fiscal_year: Option<&str>,
    ) -> Result<Vec<master_transactions::Model>, DbErr> {
        let mut query = master_transactions::Entity::find()
            .filter(master_transactions::Column::DocumentId.eq(document_id))
            .order_by_desc(master_transactions::Column::CreatedAt);
        if let Some(year) = fiscal_year {
            query = query.filter(master_transactions::Column::FiscalYear.eq(year));
        }
        query.all(&self.db).await
    }

    /// The sent-reports projection, filtered by status when given.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn sent_reports(&self, statuses: &[CoreReportStatus]) -> Result<Vec<SentReport>, DbErr> {
        let rows = self.list_by_statuses(statuses).await?;

        let org_names: HashMap<Uuid, String> = organizations::Entity::find()
            .filter(organizations::Column::Id.is_in(rows.iter().map(|r| r.organization_id)))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|o| (o.id, o.name))
            .collect();
        let report_types: HashMap<Uuid, String> = documents::Entity::find()
            .filter(documents::Column::Id.is_in(rows.iter().map(|r| r.document_id)))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|d| (d.id, d.report_type))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| SentReport {
                id: row.id,
                organization_name: org_names
                    .get(&row.organization_id)
                    .cloned()
                    .unwrap_or_default(),
                report_type: report_types.get(&row.document_id).cloned().unwrap_or_default(),
                fiscal_year: row.fiscal_year,
                created_at: row.created_at,
                document_name: row.document_name,
                report_status: row.report_status.into(),
            })
            .collect())
    }

    async fn transition<F>(
        &self,
        transaction_id: Uuid,
        decide: F,
    ) -> Result<master_transactions::Model, WorkflowError>
    where
        F: FnOnce(&ReportState) -> Result<WorkflowAction, WorkflowError>,
    {
        let txn = self.db.begin().await.map_err(db)?;

        let current = master_transactions::Entity::find_by_id(transaction_id)
            .one(&txn)
            .await
            .map_err(db)?
            .ok_or(WorkflowError::TransactionNotFound(transaction_id))?;

        let state = ReportState {
            status: current.report_status.into(),
            assigned_to: current.assigned_to,
        };
        let action = decide(&state)?;

        let mut changes = master_transactions::ActiveModel {
            report_status: Set(action.new_status().into()),
            version: Set(current.version + 1),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        match &action {
            WorkflowAction::Assign { assigned_to, .. } => {
                changes.assigned_to = Set(Some(*assigned_to));
            }
            WorkflowAction::SubmitFindings {
                submitted_by,
                remarks,
                ..
            } => {
                changes.submitted_by_auditor = Set(Some(*submitted_by));
                changes.remarks = Set(Some(remarks.clone()));
            }
            WorkflowAction::Approve {
                decided_by,
                remarks,
                ..
            } => {
                changes.decided_by = Set(Some(*decided_by));
                if let Some(remarks) = remarks {
                    changes.remarks = Set(Some(remarks.clone()));
                }
            }
            WorkflowAction::Reject {
                decided_by,
                remarks,
                ..
            } => {
                changes.decided_by = Set(Some(*decided_by));
                changes.remarks = Set(Some(remarks.clone()));
            }
        }

        let result = master_transactions::Entity::update_many()
            .set(changes)
            .filter(master_transactions::Column::Id.eq(transaction_id))
            .filter(master_transactions::Column::Version.eq(current.version))
            .exec(&txn)
            .await
            .map_err(db)?;
        if result.rows_affected == 0 {
            return Err(WorkflowError::ConcurrentModification(transaction_id));
        }

        let updated = master_transactions::Entity::find_by_id(transaction_id)
            .one(&txn)
            .await
            .map_err(db)?
            .ok_or(WorkflowError::TransactionNotFound(transaction_id))?;

        txn.commit().await.map_err(db)?;

        tracing::info!(
            %transaction_id,
            status = %action.new_status(),
            version = updated.version,
            "report {}",
            action.verb()
        );

        self.notify(&action, &updated).await;
        Ok(updated)
    }

    async fn notify(&self, action: &WorkflowAction, model: &master_transactions::Model) {
        let draft =
            NotificationDraft::for_action(action, model.id, &model.document_name, model.uploaded_by);
        if let Err(e) = NotificationRepository::new(self.db.clone()).create(&draft).await {
            tracing::warn!(
                transaction_id = %model.id,
                recipient = %draft.user_id,
                error = %e,
                "failed to store notification"
            );
        }
    }
}

fn db(err: DbErr) -> WorkflowError {
    WorkflowError::Database(err.to_string())
}
