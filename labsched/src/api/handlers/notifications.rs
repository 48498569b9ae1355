//! Notification inbox of the current user.
//!
//! Every route works on the caller's own inbox; a notification owned by someone else is a 403.

use crate::api::models::notifications::{
    ListNotificationsQuery, NotificationBulkResponse, NotificationCountResponse, NotificationResponse,
};
use crate::api::models::users::CurrentUser;
use crate::db::handlers::{NotificationFilter, Repository};
use crate::db::models::notifications::{NotificationDBResponse, NotificationUpdateDBRequest};
use crate::db::Store;
use crate::errors::{Error, Result};
use crate::{AppState, types::NotificationId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

/// Loads a notification and checks it belongs to `user`
async fn owned_notification(store: &mut dyn Store, user: &CurrentUser, id: NotificationId) -> Result<NotificationDBResponse> {
    let notification = store
        .notifications()
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Notification", id))?;

    if notification.user_id != user.id {
        return Err(Error::InsufficientPermissions {
            required: None,
            resource: "notification".to_string(),
        });
    }
    Ok(notification)
}

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    summary = "List notifications",
    description = "The caller's notifications, newest first.",
    params(ListNotificationsQuery),
    responses(
        (status = 200, description = "Notifications", body = Vec<NotificationResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn list_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Vec<NotificationResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = NotificationFilter {
        user_id: current_user.id,
        is_read: query.is_read,
        skip,
        limit,
    };

    let mut store = state.db.begin().await?;
    let notifications = store.notifications().list(&filter).await?;
    Ok(Json(notifications.into_iter().map(NotificationResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/notifications/count",
    tag = "notifications",
    summary = "Count notifications",
    responses(
        (status = 200, description = "Unread and total counts", body = NotificationCountResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn count_notifications(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<NotificationCountResponse>> {
    let mut store = state.db.begin().await?;
    let counts = store.notifications().counts(current_user.id).await?;
    Ok(Json(counts.into()))
}

#[utoipa::path(
    get,
    path = "/notifications/{id}",
    tag = "notifications",
    summary = "Get notification",
    params(("id" = NotificationId, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification", body = NotificationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Notification belongs to another user"),
        (status = 404, description = "Notification not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id, notification_id = id))]
pub async fn get_notification(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<NotificationResponse>> {
    let mut store = state.db.begin().await?;
    let notification = owned_notification(store.as_mut(), &current_user, id).await?;
    Ok(Json(notification.into()))
}

#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    tag = "notifications",
    summary = "Mark notification read",
    params(("id" = NotificationId, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = NotificationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Notification belongs to another user"),
        (status = 404, description = "Notification not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id, notification_id = id))]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<NotificationResponse>> {
    let mut store = state.db.begin().await?;
    owned_notification(store.as_mut(), &current_user, id).await?;

    let updated = store
        .notifications()
        .update(id, &NotificationUpdateDBRequest { is_read: Some(true) })
        .await?;
    store.commit().await?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    put,
    path = "/notifications/read-all",
    tag = "notifications",
    summary = "Mark all notifications read",
    responses(
        (status = 200, description = "Number of notifications marked read", body = NotificationBulkResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<NotificationBulkResponse>> {
    let mut store = state.db.begin().await?;
    let count = store.notifications().mark_all_read(current_user.id).await?;
    store.commit().await?;
    Ok(Json(NotificationBulkResponse { count }))
}

#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    tag = "notifications",
    summary = "Delete notification",
    params(("id" = NotificationId, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Notification belongs to another user"),
        (status = 404, description = "Notification not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id, notification_id = id))]
pub async fn delete_notification(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode> {
    let mut store = state.db.begin().await?;
    owned_notification(store.as_mut(), &current_user, id).await?;
    store.notifications().delete(id).await?;
    store.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/notifications",
    tag = "notifications",
    summary = "Delete all notifications",
    responses(
        (status = 200, description = "Number of notifications deleted", body = NotificationBulkResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn delete_all_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<NotificationBulkResponse>> {
    let mut store = state.db.begin().await?;
    let count = store.notifications().delete_all(current_user.id).await?;
    store.commit().await?;
    Ok(Json(NotificationBulkResponse { count }))
}
