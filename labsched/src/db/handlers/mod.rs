//! Repository traits and their PostgreSQL implementations.
//!
//! Each entity module defines:
//! - a `*Filter` for list operations (with a `matches` predicate the in-memory backend reuses)
//! - a `*Repository` trait fixing the [`Repository`] associated types, plus any entity-specific
//!   queries
//! - a PostgreSQL repository struct wrapping the connection of the open transaction
//!
//! The in-memory implementations live in [`crate::db::memory`].
//!
//! # Common Pattern
//!
//! Repositories are never built directly by handlers. A unit of work is opened from the
//! [`crate::db::Database`] and repositories are borrowed from it:
//!
//! ```ignore
//! let mut store = state.db.begin().await?;
//! let room = store.lab_rooms().get_by_id(room_id).await?;
//! store.commit().await?;
//! ```

pub mod courses;
pub mod lab_rooms;
pub mod notifications;
pub mod repository;
pub mod schedules;
pub mod sections;
pub mod semesters;
pub mod users;

pub use courses::{CourseFilter, CourseRepository, Courses};
pub use lab_rooms::{LabRoomFilter, LabRoomRepository, LabRooms};
pub use notifications::{NotificationCounts, NotificationFilter, NotificationRepository, Notifications};
pub use repository::Repository;
pub use schedules::{ScheduleFilter, ScheduleRepository, Schedules};
pub use sections::{SectionFilter, SectionRepository, Sections};
pub use semesters::{SemesterFilter, SemesterRepository, Semesters};
pub use users::{UserFilter, UserRepository, Users};
