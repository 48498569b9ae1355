//! In-app notification delivery.
//!
//! The scheduling service tells instructors about assignments and cancellations through a
//! [`NotificationSink`]. Enqueueing never blocks and never fails the caller: the production
//! [`Notifier`] pushes onto a bounded channel drained by a background worker, which writes each
//! notice to the inbox in its own unit of work. A full or closed queue, or a failed write, is
//! logged at `warn` and the notice is dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::Database;
use crate::db::errors::Result as DbResult;
use crate::db::handlers::Repository;
use crate::db::models::notifications::NotificationCreateDBRequest;
use crate::types::UserId;

/// A message addressed to one user's inbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(user_id: UserId, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl From<Notice> for NotificationCreateDBRequest {
    fn from(notice: Notice) -> Self {
        Self {
            user_id: notice.user_id,
            title: notice.title,
            message: notice.message,
        }
    }
}

/// Fire-and-forget destination for notices.
pub trait NotificationSink: Send + Sync {
    fn enqueue(&self, notice: Notice);
}

/// Queue-backed sink with a background writer.
#[derive(Clone)]
pub struct Notifier {
    sender: mpsc::Sender<Notice>,
}

impl Notifier {
    /// Start the writer task. It drains the queue until `shutdown` fires or every sender is dropped.
    pub fn spawn(db: Arc<dyn Database>, queue_capacity: usize, shutdown: CancellationToken) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let handle = tokio::spawn(run_notification_writer(db, receiver, shutdown));
        (Self { sender }, handle)
    }
}

impl NotificationSink for Notifier {
    fn enqueue(&self, notice: Notice) {
        if let Err(e) = self.sender.try_send(notice) {
            let (reason, notice) = match e {
                mpsc::error::TrySendError::Full(n) => ("queue full", n),
                mpsc::error::TrySendError::Closed(n) => ("queue closed", n),
            };
            tracing::warn!(user_id = notice.user_id, title = %notice.title, reason, "Dropping notification");
        }
    }
}

async fn run_notification_writer(db: Arc<dyn Database>, mut receiver: mpsc::Receiver<Notice>, shutdown: CancellationToken) {
    tracing::info!("Starting notification writer");

    loop {
        let notice = tokio::select! {
            received = receiver.recv() => match received {
                Some(notice) => notice,
                None => break,
            },
            _ = shutdown.cancelled() => break,
        };

        let user_id = notice.user_id;
        if let Err(e) = write_notice(db.as_ref(), notice).await {
            tracing::warn!(user_id, error = %e, "Failed to write notification");
        } else {
            tracing::debug!(user_id, "Wrote notification");
        }
    }

    tracing::info!("Notification writer shutting down");
}

/// Persist one notice in its own unit of work
pub async fn write_notice(db: &dyn Database, notice: Notice) -> DbResult<()> {
    let mut store = db.begin().await?;
    store.notifications().create(&notice.into()).await?;
    store.commit().await
}

/// Sink that records notices in memory, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSink {
    notices: std::sync::Mutex<Vec<Notice>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl NotificationSink for RecordingSink {
    fn enqueue(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;
    use crate::db::handlers::NotificationFilter;
    use crate::test_utils::Fixture;
    use std::time::Duration;

    async fn inbox_len(db: &dyn Database, user_id: UserId) -> usize {
        let mut store = db.begin().await.unwrap();
        let rows = store.notifications().list(&NotificationFilter::for_user(user_id)).await.unwrap();
        rows.len()
    }

    #[test_log::test(tokio::test)]
    async fn test_notifier_writes_to_inbox() {
        let fx = Fixture::seeded().await;
        let db: Arc<dyn Database> = fx.db.clone();
        let shutdown = CancellationToken::new();
        let (notifier, handle) = Notifier::spawn(db.clone(), 8, shutdown.clone());

        notifier.enqueue(Notice::new(fx.instructor_id, "New Schedule Assigned", "hello"));

        let mut written = 0;
        for _ in 0..50 {
            written = inbox_len(db.as_ref(), fx.instructor_id).await;
            if written == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(written, 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[test_log::test(tokio::test)]
    async fn test_enqueue_after_shutdown_does_not_panic() {
        let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
        let shutdown = CancellationToken::new();
        let (notifier, handle) = Notifier::spawn(db, 1, shutdown.clone());

        shutdown.cancel();
        handle.await.unwrap();

        // Receiver is gone; the notice is logged and dropped
        notifier.enqueue(Notice::new(1, "t", "m"));
    }

    #[test_log::test(tokio::test)]
    async fn test_write_failure_is_reported() {
        let db = MemoryDatabase::new();
        // No such user: the foreign key check rejects the insert
        let result = write_notice(&db, Notice::new(42, "t", "m")).await;
        assert!(result.is_err());
    }
}
