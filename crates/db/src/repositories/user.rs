//! User repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use armas_shared::{AppError, AppResult};

use super::db_error;
use crate::entities::{
    directorates, master_transactions, organizations, roles, user_roles, users,
};

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login name.
    pub username: String,
    /// Argon2id PHC hash.
    pub password_hash: String,
    /// Display name.
    pub full_name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Organization membership.
    pub organization_id: Option<Uuid>,
    /// Directorate membership.
    pub directorate_id: Option<Uuid>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Checks if a username is already taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn username_exists(&self, username: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Lists all users ordered by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .order_by_asc(users::Column::Username)
            .all(&self.db)
            .await
    }

    /// Creates a user holding the given roles, atomically.
    ///
    /// # Errors
    ///
    /// * `Conflict` if the username is taken
    /// * `NotFound` for an unknown organization, directorate or role
    pub async fn create(&self, input: NewUser, role_ids: &[Uuid]) -> AppResult<users::Model> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let taken = users::Entity::find()
            .filter(users::Column::Username.eq(&input.username))
            .count(&txn)
            .await
            .map_err(db_error)?;
        if taken > 0 {
            return Err(AppError::Conflict(format!(
                "username '{}' is already taken",
                input.username
            )));
        }

        if let Some(org_id) = input.organization_id {
            organizations::Entity::find_by_id(org_id)
                .one(&txn)
                .await
                .map_err(db_error)?
                .ok_or_else(|| AppError::not_found("Organization", org_id))?;
        }
        if let Some(dir_id) = input.directorate_id {
            directorates::Entity::find_by_id(dir_id)
                .one(&txn)
                .await
                .map_err(db_error)?
                .ok_or_else(|| AppError::not_found("Directorate", dir_id))?;
        }

        let mut role_ids = role_ids.to_vec();
        role_ids.sort_unstable();
        role_ids.dedup();

        let found_roles = roles::Entity::find()
            .filter(roles::Column::Id.is_in(role_ids.iter().copied()))
            .count(&txn)
            .await
            .map_err(db_error)?;
        if usize::try_from(found_roles).unwrap_or(usize::MAX) != role_ids.len() {
            return Err(AppError::NotFound("one or more roles not found".into()));
        }

        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(input.username),
            password_hash: Set(input.password_hash),
            full_name: Set(input.full_name),
            email: Set(input.email),
            enabled: Set(true),
            organization_id: Set(input.organization_id),
            directorate_id: Set(input.directorate_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_error)?;

        for role_id in role_ids {
            user_roles::ActiveModel {
                user_id: Set(user.id),
                role_id: Set(role_id),
            }
            .insert(&txn)
            .await
            .map_err(db_error)?;
        }

        txn.commit().await.map_err(db_error)?;

        tracing::info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// Replaces a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()> {
        let user = self
            .find_by_id(user_id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::not_found("User", user_id))?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash.to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await.map_err(db_error)?;

        Ok(())
    }

    /// Deletes a user and, by cascade, the reports they uploaded.
    ///
    /// Returns the storage paths of the cascaded reports so the caller can
    /// remove the files.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub async fn delete(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        let user = self
            .find_by_id(user_id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::not_found("User", user_id))?;

        let paths: Vec<String> = master_transactions::Entity::find()
            .select_only()
            .column(master_transactions::Column::StoragePath)
            .filter(master_transactions::Column::UploadedBy.eq(user_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_error)?;

        user.delete(&self.db).await.map_err(db_error)?;

        tracing::info!(%user_id, cascaded_reports = paths.len(), "user deleted");
        Ok(paths)
    }
}
