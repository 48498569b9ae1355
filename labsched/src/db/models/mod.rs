//! Store record models.
//!
//! Each entity has three shapes, mirroring the repository trait's associated types:
//!
//! - `*CreateDBRequest`: fully-validated values to insert
//! - `*UpdateDBRequest`: partial updates, `None` leaves the stored value untouched
//! - `*DBResponse`: a stored record as returned by either backend
//!
//! Store models are distinct from API models so the wire format can evolve separately from the
//! schema. Conversions from API requests live next to the store models; conversions to API
//! responses live in [`crate::api::models`].

pub mod courses;
pub mod lab_rooms;
pub mod notifications;
pub mod schedules;
pub mod sections;
pub mod semesters;
pub mod users;
