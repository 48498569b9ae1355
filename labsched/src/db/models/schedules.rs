//! Store models for schedules.

use crate::types::{CourseId, DayOfWeek, LabRoomId, ScheduleId, SectionId, SemesterId, UserId};
use chrono::{DateTime, NaiveTime, Utc};

/// Store request for creating a schedule. Times are already parsed and ordered.
#[derive(Debug, Clone)]
pub struct ScheduleCreateDBRequest {
    pub semester_id: SemesterId,
    pub course_id: CourseId,
    pub section_id: SectionId,
    pub lab_room_id: LabRoomId,
    pub instructor_id: UserId,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_lab: bool,
    pub created_by: UserId,
}

/// Store request for updating a schedule
#[derive(Debug, Clone, Default)]
pub struct ScheduleUpdateDBRequest {
    pub semester_id: Option<SemesterId>,
    pub course_id: Option<CourseId>,
    pub section_id: Option<SectionId>,
    pub lab_room_id: Option<LabRoomId>,
    pub instructor_id: Option<UserId>,
    pub day_of_week: Option<DayOfWeek>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_lab: Option<bool>,
}

/// A stored schedule
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDBResponse {
    pub id: ScheduleId,
    pub semester_id: SemesterId,
    pub course_id: CourseId,
    pub section_id: SectionId,
    pub lab_room_id: LabRoomId,
    pub instructor_id: UserId,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_lab: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleDBResponse {
    /// The record as it would look with `update` applied
    pub fn with_update(&self, update: &ScheduleUpdateDBRequest) -> Self {
        Self {
            semester_id: update.semester_id.unwrap_or(self.semester_id),
            course_id: update.course_id.unwrap_or(self.course_id),
            section_id: update.section_id.unwrap_or(self.section_id),
            lab_room_id: update.lab_room_id.unwrap_or(self.lab_room_id),
            instructor_id: update.instructor_id.unwrap_or(self.instructor_id),
            day_of_week: update.day_of_week.unwrap_or(self.day_of_week),
            start_time: update.start_time.unwrap_or(self.start_time),
            end_time: update.end_time.unwrap_or(self.end_time),
            is_lab: update.is_lab.unwrap_or(self.is_lab),
            ..self.clone()
        }
    }
}
