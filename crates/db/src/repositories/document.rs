//! Document (report type) repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use armas_shared::{AppError, AppResult};

use super::db_error;
use crate::entities::{directorates, documents};

/// Document repository.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    db: DatabaseConnection,
}

impl DocumentRepository {
    /// Creates a new document repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a document by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<documents::Model>, DbErr> {
        documents::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists documents, optionally restricted to one directorate.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, directorate_id: Option<Uuid>) -> Result<Vec<documents::Model>, DbErr> {
        let mut query = documents::Entity::find().order_by_asc(documents::Column::ReportType);
        if let Some(dir_id) = directorate_id {
            query = query.filter(documents::Column::DirectorateId.eq(dir_id));
        }
        query.all(&self.db).await
    }

    /// Creates a report type under a directorate.
    ///
    /// # Errors
    ///
    /// * `Validation` for a blank report type
    /// * `NotFound` for an unknown directorate
    /// * `Conflict` if the directorate already has this report type
    pub async fn create(&self, report_type: &str, directorate_id: Uuid) -> AppResult<documents::Model> {
        let report_type = report_type.trim();
        if report_type.is_empty() {
            return Err(AppError::Validation("report type is required".into()));
        }

        directorates::Entity::find_by_id(directorate_id)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::not_found("Directorate", directorate_id))?;

        let taken = documents::Entity::find()
            .filter(documents::Column::DirectorateId.eq(directorate_id))
            .filter(documents::Column::ReportType.eq(report_type))
            .count(&self.db)
            .await
            .map_err(db_error)?;
        if taken > 0 {
            return Err(AppError::Conflict(format!(
                "report type '{report_type}' already exists for this directorate"
            )));
        }

        let document = documents::ActiveModel {
            id: Set(Uuid::new_v4()),
            report_type: Set(report_type.to_string()),
            directorate_id: Set(directorate_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(db_error)?;

        tracing::info!(document_id = %document.id, report_type = %document.report_type, "document created");
        Ok(document)
    }
}
