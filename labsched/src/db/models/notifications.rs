//! Store models for in-app notifications.

use crate::types::{NotificationId, UserId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct NotificationCreateDBRequest {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationUpdateDBRequest {
    pub is_read: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDBResponse {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
