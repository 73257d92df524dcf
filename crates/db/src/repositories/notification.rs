//! Notification inbox repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use armas_core::workflow::NotificationDraft;
use armas_shared::{AppError, AppResult};

use super::db_error;
use crate::entities::notifications;

/// Notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores a drafted notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, draft: &NotificationDraft) -> Result<notifications::Model, DbErr> {
        notifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(draft.user_id),
            title: Set(draft.title.clone()),
            message: Set(draft.message.clone()),
            entity_type: Set(draft.entity_type.to_string()),
            entity_id: Set(draft.entity_id),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }

    /// Lists a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<notifications::Model>, DbErr> {
        let mut query = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .order_by_desc(notifications::Column::CreatedAt);
        if unread_only {
            query = query.filter(notifications::Column::IsRead.eq(false));
        }
        query.all(&self.db).await
    }

    /// Marks a notification as read.
    ///
    /// Someone else's notification is reported as not found.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the notification does not belong to `user_id`.
    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<notifications::Model> {
        let notification = notifications::Entity::find_by_id(notification_id)
            .filter(notifications::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::not_found("Notification", notification_id))?;

        if notification.is_read {
            return Ok(notification);
        }

        let mut active: notifications::ActiveModel = notification.into();
        active.is_read = Set(true);
        active.update(&self.db).await.map_err(db_error)
    }
}
