//! HTTP API layer.
//!
//! - **[`handlers`]**: Axum route handlers, one module per resource
//! - **[`models`]**: Request/response bodies and query parameters
//! - **[`json`]**: JSON body extractor whose rejections are 400 validation errors
//!
//! # API Structure
//!
//! Everything except `/healthz` lives under `/api/v1`:
//!
//! - **Schedules** (`/schedules`): lab bookings; create and update run the conflict check
//! - **Catalog** (`/semesters`, `/courses`, `/sections`, `/lab-rooms`)
//! - **Users** (`/users`, `/users/current`)
//! - **Notifications** (`/notifications`): the caller's inbox
//!
//! Callers identify themselves with the configured user header (`x-labsched-user` by default).
//! The OpenAPI document is at `/api/v1/openapi.json` and browsable at `/api/docs`.

pub mod handlers;
pub mod json;
pub mod models;
