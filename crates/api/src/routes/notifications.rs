//! Notification inbox routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiResult, AppState, middleware::AuthUser};
use armas_db::NotificationRepository;
use armas_db::entities::notifications;

/// Creates the notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", put(mark_read))
}

/// Response for a notification.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    /// Notification ID.
    pub id: Uuid,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Kind of the referenced entity.
    pub entity_type: String,
    /// Referenced entity.
    pub entity_id: Uuid,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

impl From<notifications::Model> for NotificationResponse {
    fn from(n: notifications::Model) -> Self {
        Self {
            id: n.id,
            title: n.title,
            message: n.message,
            entity_type: n.entity_type,
            entity_id: n.entity_id,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

/// Query parameters of `GET /notifications`.
#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
    /// Only unread notifications.
    #[serde(default)]
    pub unread: bool,
}

/// GET /notifications - The caller's inbox, newest first.
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<InboxQuery>,
) -> ApiResult<Json<Vec<NotificationResponse>>> {
    let items = NotificationRepository::new((*state.db).clone())
        .list_for_user(auth.user_id(), query.unread)
        .await?;
    Ok(Json(
        items.into_iter().map(NotificationResponse::from).collect(),
    ))
}

/// PUT /notifications/{id}/read
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<Json<NotificationResponse>> {
    let item = NotificationRepository::new((*state.db).clone())
        .mark_read(notification_id, auth.user_id())
        .await?;
    Ok(Json(item.into()))
}
