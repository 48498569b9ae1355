//! Identity and authorization at the HTTP boundary.
//!
//! The service sits behind an authenticating proxy that forwards the user id in a trusted header
//! (`auth.user_header`, default `x-labsched-user`). Nothing here verifies credentials.
//!
//! - [`current_user`]: the [`CurrentUser`](crate::api::models::users::CurrentUser) extractor,
//!   which loads the user and derives their permissions
//! - [`permissions`]: the fixed role table and the [`RequiresPermission`](permissions::RequiresPermission)
//!   guard for handlers whose policy is purely permission-based
//!
//! Handlers pass `current_user.actor()` into the scheduling core, which repeats its own
//! permission check; ownership rules (notification inbox) are checked in the handlers.
//!
//! ```ignore
//! async fn create_course(
//!     State(state): State<AppState>,
//!     _: RequiresPermission<permission::FullSchedulingControl>,
//!     JsonBody(body): JsonBody<CourseCreate>,
//! ) -> Result<(StatusCode, Json<CourseResponse>)> { ... }
//! ```

pub mod current_user;
pub mod permissions;
