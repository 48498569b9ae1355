//! API request/response models for schedules.

use crate::db::models::schedules::ScheduleDBResponse;
use crate::types::{CourseId, DayOfWeek, LabRoomId, ScheduleId, SectionId, SemesterId, UserId};
use crate::validation::format_time;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Request body for creating a schedule.
///
/// Every field is required; they are optional here so a request missing several of them is
/// rejected with all missing names at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ScheduleCreate {
    pub semester_id: Option<SemesterId>,
    pub course_id: Option<CourseId>,
    pub section_id: Option<SectionId>,
    pub lab_room_id: Option<LabRoomId>,
    pub instructor_id: Option<UserId>,
    /// `Monday` through `Sunday`, case-insensitive
    #[schema(example = "Monday")]
    pub day_of_week: Option<String>,
    /// `HH:MM`
    #[schema(example = "09:00")]
    pub start_time: Option<String>,
    /// `HH:MM`, strictly after `start_time`
    #[schema(example = "10:30")]
    pub end_time: Option<String>,
    pub is_lab: Option<bool>,
}

/// Request body for updating a schedule. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ScheduleUpdate {
    pub semester_id: Option<SemesterId>,
    pub course_id: Option<CourseId>,
    pub section_id: Option<SectionId>,
    pub lab_room_id: Option<LabRoomId>,
    pub instructor_id: Option<UserId>,
    pub day_of_week: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_lab: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleResponse {
    pub id: ScheduleId,
    pub semester_id: SemesterId,
    pub course_id: CourseId,
    pub section_id: SectionId,
    pub lab_room_id: LabRoomId,
    pub instructor_id: UserId,
    pub day_of_week: DayOfWeek,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "10:30")]
    pub end_time: String,
    pub is_lab: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ScheduleDBResponse> for ScheduleResponse {
    fn from(db: ScheduleDBResponse) -> Self {
        Self {
            id: db.id,
            semester_id: db.semester_id,
            course_id: db.course_id,
            section_id: db.section_id,
            lab_room_id: db.lab_room_id,
            instructor_id: db.instructor_id,
            day_of_week: db.day_of_week,
            start_time: format_time(db.start_time),
            end_time: format_time(db.end_time),
            is_lab: db.is_lab,
            created_by: db.created_by,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing schedules
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListSchedulesQuery {
    /// Semester to list. The literal `new` (a semester still being drafted) matches nothing.
    pub semester_id: Option<String>,
    /// `Monday` through `Sunday`, case-insensitive
    pub day_of_week: Option<String>,
    pub section_id: Option<SectionId>,
    pub lab_room_id: Option<LabRoomId>,
    pub instructor_id: Option<UserId>,
}
