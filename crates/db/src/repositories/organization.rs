//! Organization and directorate repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use armas_shared::{AppError, AppResult};

use super::db_error;
use crate::entities::{directorates, organizations};

/// Organization repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an organization by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<organizations::Model>, DbErr> {
        organizations::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists organizations ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<organizations::Model>, DbErr> {
        organizations::Entity::find()
            .order_by_asc(organizations::Column::Name)
            .all(&self.db)
            .await
    }

    /// Creates an organization.
    ///
    /// # Errors
    ///
    /// * `Validation` for a blank name
    /// * `Conflict` if the name is taken
    /// * `NotFound` for an unknown directorate
    pub async fn create(
        &self,
        name: &str,
        directorate_id: Option<Uuid>,
        organization_head: Option<String>,
    ) -> AppResult<organizations::Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("organization name is required".into()));
        }

        let taken = organizations::Entity::find()
            .filter(organizations::Column::Name.eq(name))
            .count(&self.db)
            .await
            .map_err(db_error)?;
        if taken > 0 {
            return Err(AppError::Conflict(format!(
                "organization '{name}' already exists"
            )));
        }

        if let Some(dir_id) = directorate_id {
            self.find_directorate(dir_id)
                .await
                .map_err(db_error)?
                .ok_or_else(|| AppError::not_found("Directorate", dir_id))?;
        }

        let org = organizations::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            directorate_id: Set(directorate_id),
            organization_head: Set(organization_head.filter(|h| !h.trim().is_empty())),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(db_error)?;

        tracing::info!(organization_id = %org.id, name = %org.name, "organization created");
        Ok(org)
    }

    /// Sets or clears the head of an organization.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown organization.
    pub async fn set_head(
        &self,
        organization_id: Uuid,
        username: Option<String>,
    ) -> AppResult<organizations::Model> {
        let org = self
            .find_by_id(organization_id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::not_found("Organization", organization_id))?;

        let mut active: organizations::ActiveModel = org.into();
        active.organization_head = Set(username.filter(|h| !h.trim().is_empty()));
        let updated = active.update(&self.db).await.map_err(db_error)?;

        tracing::info!(%organization_id, head = ?updated.organization_head, "organization head set");
        Ok(updated)
    }

    /// Finds a directorate by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_directorate(&self, id: Uuid) -> Result<Option<directorates::Model>, DbErr> {
        directorates::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists directorates ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_directorates(&self) -> Result<Vec<directorates::Model>, DbErr> {
        directorates::Entity::find()
            .order_by_asc(directorates::Column::Name)
            .all(&self.db)
            .await
    }

    /// Creates a directorate.
    ///
    /// # Errors
    ///
    /// * `Validation` for a blank name
    /// * `Conflict` if the name is taken
    pub async fn create_directorate(&self, name: &str) -> AppResult<directorates::Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("directorate name is required".into()));
        }

        let taken = directorates::Entity::find()
            .filter(directorates::Column::Name.eq(name))
            .count(&self.db)
            .await
            .map_err(db_error)?;
        if taken > 0 {
            return Err(AppError::Conflict(format!(
                "directorate '{name}' already exists"
            )));
        }

        directorates::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(db_error)
    }
}
