//! API request/response models for the notification inbox.

use super::pagination::Pagination;
use crate::db::handlers::NotificationCounts;
use crate::db::models::notifications::NotificationDBResponse;
use crate::types::{NotificationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationDBResponse> for NotificationResponse {
    fn from(db: NotificationDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            title: db.title,
            message: db.message,
            is_read: db.is_read,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationCountResponse {
    pub unread_count: i64,
    pub total_count: i64,
}

impl From<NotificationCounts> for NotificationCountResponse {
    fn from(counts: NotificationCounts) -> Self {
        Self {
            unread_count: counts.unread_count,
            total_count: counts.total_count,
        }
    }
}

/// Number of notifications a bulk operation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationBulkResponse {
    pub count: u64,
}

#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListNotificationsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only read (`true`) or unread (`false`) notifications
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub is_read: Option<bool>,
}
