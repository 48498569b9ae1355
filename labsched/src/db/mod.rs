//! Store layer for data persistence and access.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers, scheduling service)
//! └──────┬──────┘
//!        │ Database::begin()
//!        ↓
//! ┌─────────────┐
//! │    Store    │  (one unit of work; commit or drop)
//! └──────┬──────┘
//!        │ store.schedules(), store.users(), ...
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers traits)
//! └──────┬──────┘
//!        ↓
//! ┌──────────────────────────┐
//! │ PostgreSQL  │  in-memory │
//! └──────────────────────────┘
//! ```
//!
//! # Units of work
//!
//! [`Database::begin`] opens a [`Store`]: a PostgreSQL transaction, or a staged copy of the
//! in-memory tables held under the store-wide lock. Everything read and written through the
//! repositories it hands out is isolated until [`Store::commit`]; dropping the store without
//! committing discards its writes.
//!
//! Only one store should be open per task at a time: the in-memory backend serializes units of
//! work, so nesting two in the same task would wait on itself.
//!
//! # Migrations
//!
//! PostgreSQL migrations live in `migrations/` and run on startup through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

use errors::Result;
use handlers::{CourseRepository, LabRoomRepository, NotificationRepository, ScheduleRepository, SectionRepository, SemesterRepository, UserRepository};

pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;

/// A backend that can open units of work.
#[async_trait]
pub trait Database: Send + Sync + 'static {
    /// Open a unit of work
    async fn begin(&self) -> Result<Box<dyn Store>>;

    /// Cheap liveness probe for the backend
    async fn health_check(&self) -> Result<()>;

    /// Release backend resources (connection pools) on shutdown
    async fn close(&self) {}
}

/// One unit of work. Repositories borrowed from it see its uncommitted writes.
#[async_trait]
pub trait Store: Send {
    fn schedules(&mut self) -> Box<dyn ScheduleRepository + '_>;
    fn semesters(&mut self) -> Box<dyn SemesterRepository + '_>;
    fn courses(&mut self) -> Box<dyn CourseRepository + '_>;
    fn sections(&mut self) -> Box<dyn SectionRepository + '_>;
    fn lab_rooms(&mut self) -> Box<dyn LabRoomRepository + '_>;
    fn users(&mut self) -> Box<dyn UserRepository + '_>;
    fn notifications(&mut self) -> Box<dyn NotificationRepository + '_>;

    /// Make every write of this unit of work visible atomically
    async fn commit(self: Box<Self>) -> Result<()>;
}
