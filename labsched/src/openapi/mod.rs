//! OpenAPI document for the `/api/v1` surface, served as JSON at `/api/v1/openapi.json`
//! and rendered with Scalar at `/api/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;
use crate::scheduling::conflicts::ConflictDimension;
use crate::types::{DayOfWeek, Permission, PermissionSet};

/// Identity header set by the fronting gateway.
struct IdentityHeaderAddon;

impl Modify for IdentityHeaderAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "X-Labsched-User".to_string(),
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "x-labsched-user",
                    "Numeric id of the signed-in user, forwarded by the authenticating gateway. \
                     The header name follows `auth.user_header` in the server configuration.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "labsched",
        description = "Laboratory room scheduling: bookings with room, section and instructor conflict checks, \
                       the catalog they reference, users, and the in-app notification inbox."
    ),
    servers(
        (url = "/api/v1", description = "Scheduling API")
    ),
    modifiers(&IdentityHeaderAddon),
    paths(
        api::handlers::schedules::list_schedules,
        api::handlers::schedules::create_schedule,
        api::handlers::schedules::get_schedule,
        api::handlers::schedules::update_schedule,
        api::handlers::schedules::delete_schedule,
        api::handlers::semesters::list_semesters,
        api::handlers::semesters::create_semester,
        api::handlers::semesters::get_semester,
        api::handlers::semesters::update_semester,
        api::handlers::semesters::delete_semester,
        api::handlers::courses::list_courses,
        api::handlers::courses::create_course,
        api::handlers::courses::get_course,
        api::handlers::courses::update_course,
        api::handlers::courses::delete_course,
        api::handlers::sections::list_sections,
        api::handlers::sections::create_section,
        api::handlers::sections::get_section,
        api::handlers::sections::update_section,
        api::handlers::sections::delete_section,
        api::handlers::lab_rooms::list_lab_rooms,
        api::handlers::lab_rooms::create_lab_room,
        api::handlers::lab_rooms::get_lab_room,
        api::handlers::lab_rooms::update_lab_room,
        api::handlers::lab_rooms::delete_lab_room,
        api::handlers::users::list_users,
        api::handlers::users::create_user,
        api::handlers::users::get_current_user,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::notifications::list_notifications,
        api::handlers::notifications::count_notifications,
        api::handlers::notifications::get_notification,
        api::handlers::notifications::mark_notification_read,
        api::handlers::notifications::mark_all_notifications_read,
        api::handlers::notifications::delete_notification,
        api::handlers::notifications::delete_all_notifications,
    ),
    components(
        schemas(
            DayOfWeek,
            Permission,
            PermissionSet,
            ConflictDimension,
            api::models::schedules::ScheduleCreate,
            api::models::schedules::ScheduleUpdate,
            api::models::schedules::ScheduleResponse,
            api::models::semesters::SemesterCreate,
            api::models::semesters::SemesterUpdate,
            api::models::semesters::SemesterResponse,
            api::models::courses::CourseCreate,
            api::models::courses::CourseUpdate,
            api::models::courses::CourseResponse,
            api::models::sections::SectionCreate,
            api::models::sections::SectionUpdate,
            api::models::sections::SectionResponse,
            api::models::lab_rooms::LabRoomCreate,
            api::models::lab_rooms::LabRoomUpdate,
            api::models::lab_rooms::LabRoomResponse,
            api::models::users::Role,
            api::models::users::UserCreate,
            api::models::users::UserUpdate,
            api::models::users::UserResponse,
            api::models::users::CurrentUser,
            api::models::notifications::NotificationResponse,
            api::models::notifications::NotificationCountResponse,
            api::models::notifications::NotificationBulkResponse,
        )
    ),
    tags(
        (name = "schedules", description = "Lab bookings and conflict detection"),
        (name = "semesters", description = "Academic terms"),
        (name = "courses", description = "Course catalog"),
        (name = "sections", description = "Student sections"),
        (name = "lab-rooms", description = "Laboratory rooms"),
        (name = "users", description = "Accounts and roles"),
        (name = "notifications", description = "In-app notification inbox"),
    )
)]
pub struct ApiDoc;
