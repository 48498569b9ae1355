//! Repository for per-user notifications.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::notifications::{NotificationCreateDBRequest, NotificationDBResponse, NotificationUpdateDBRequest},
    },
    types::{NotificationId, UserId},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing one user's notifications
#[derive(Debug, Clone)]
pub struct NotificationFilter {
    pub user_id: UserId,
    pub is_read: Option<bool>,
    pub skip: i64,
    pub limit: i64,
}

impl NotificationFilter {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_read: None,
            skip: 0,
            limit: i64::MAX,
        }
    }

    pub fn matches(&self, notification: &NotificationDBResponse) -> bool {
        notification.user_id == self.user_id && self.is_read.is_none_or(|is_read| notification.is_read == is_read)
    }
}

/// Unread and total notification counts for one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct NotificationCounts {
    pub unread_count: i64,
    pub total_count: i64,
}

/// Notification storage. Listing is newest first.
#[async_trait]
pub trait NotificationRepository:
    Repository<
        CreateRequest = NotificationCreateDBRequest,
        UpdateRequest = NotificationUpdateDBRequest,
        Response = NotificationDBResponse,
        Id = NotificationId,
        Filter = NotificationFilter,
    >
{
    async fn counts(&mut self, user_id: UserId) -> Result<NotificationCounts>;

    /// Marks every unread notification as read, returning how many changed
    async fn mark_all_read(&mut self, user_id: UserId) -> Result<u64>;

    /// Deletes every notification for the user, returning how many were removed
    async fn delete_all(&mut self, user_id: UserId) -> Result<u64>;
}

#[derive(Debug, Clone, FromRow)]
struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDBResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            user_id: n.user_id,
            title: n.title,
            message: n.message,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

pub struct Notifications<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Notifications<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl<'c> Repository for Notifications<'c> {
    type CreateRequest = NotificationCreateDBRequest;
    type UpdateRequest = NotificationUpdateDBRequest;
    type Response = NotificationDBResponse;
    type Id = NotificationId;
    type Filter = NotificationFilter;

    #[instrument(skip(self, request), fields(user_id = request.user_id, title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let notification = sqlx::query_as::<_, Notification>("INSERT INTO notifications (user_id, title, message) VALUES ($1, $2, $3) RETURNING *")
            .bind(request.user_id)
            .bind(&request.title)
            .bind(&request.message)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(NotificationDBResponse::from(notification))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let notification = sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(notification.map(NotificationDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(user_id = filter.user_id, is_read = ?filter.is_read), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM notifications WHERE user_id = ");
        query.push_bind(filter.user_id);
        if let Some(is_read) = filter.is_read {
            query.push(" AND is_read = ");
            query.push_bind(is_read);
        }
        query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let notifications = query.build_query_as::<Notification>().fetch_all(&mut *self.db).await?;

        Ok(notifications.into_iter().map(NotificationDBResponse::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let notification =
            sqlx::query_as::<_, Notification>("UPDATE notifications SET is_read = COALESCE($2, is_read) WHERE id = $1 RETURNING *")
                .bind(id)
                .bind(request.is_read)
                .fetch_optional(&mut *self.db)
                .await?
                .ok_or(DbError::NotFound)?;

        Ok(NotificationDBResponse::from(notification))
    }
}

#[async_trait]
impl<'c> NotificationRepository for Notifications<'c> {
    #[instrument(skip(self), err)]
    async fn counts(&mut self, user_id: UserId) -> Result<NotificationCounts> {
        let counts = sqlx::query_as::<_, NotificationCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE NOT is_read) AS unread_count,
                COUNT(*) AS total_count
            FROM notifications
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(counts)
    }

    #[instrument(skip(self), err)]
    async fn mark_all_read(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), err)]
    async fn delete_all(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
