//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request deserialization and field validation
//! - Resolving the caller and checking permissions
//! - Running the operation in one unit of work
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`schedules`]: weekly bookings, delegating to [`crate::scheduling::service`]
//! - [`semesters`], [`courses`], [`sections`], [`lab_rooms`]: the reference catalog
//! - [`users`]: accounts and the current user
//! - [`notifications`]: the caller's inbox
//! - [`health`]: liveness probe
//!
//! # Authentication
//!
//! Every `/api/v1` handler takes either a [`crate::api::models::users::CurrentUser`] or a
//! [`crate::auth::permissions::RequiresPermission`] extractor. Reads need only an authenticated
//! caller; writes name the permission they need.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which converts to the matching HTTP status and body.

pub mod courses;
pub mod health;
pub mod lab_rooms;
pub mod notifications;
pub mod schedules;
pub mod sections;
pub mod semesters;
pub mod users;

use crate::db::errors::DbError;
use crate::errors::Error;

/// Maps a store-level "no such row" from an update to a 404 naming the resource
pub(crate) fn not_found_as(resource: &'static str, id: i64) -> impl FnOnce(DbError) -> Error {
    move |err| match err {
        DbError::NotFound => Error::not_found(resource, id),
        other => Error::Database(other),
    }
}
