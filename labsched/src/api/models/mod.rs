//! API request and response data models.
//!
//! These structures define the public HTTP contract and are kept separate from the store models
//! in [`crate::db::models`], so the wire format can evolve independently of the schema.
//!
//! Create and update bodies use `Option` fields throughout: missing required fields are reported
//! together by [`crate::validation::RequiredFields`] rather than failing deserialization on the
//! first one. Times travel as `HH:MM` strings and dates as `YYYY-MM-DD`.
//!
//! # Model Categories
//!
//! - [`schedules`]: weekly lab bookings
//! - [`semesters`], [`courses`], [`sections`], [`lab_rooms`]: the catalog a booking references
//! - [`users`]: accounts, roles and the resolved current user
//! - [`notifications`]: the per-user inbox
//! - [`pagination`]: shared `skip`/`limit` parameters

pub mod courses;
pub mod lab_rooms;
pub mod notifications;
pub mod pagination;
pub mod schedules;
pub mod sections;
pub mod semesters;
pub mod users;
