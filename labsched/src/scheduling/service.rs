//! Schedule create/update/delete/read.
//!
//! Each mutating call receives an open [`Store`] and consumes it: the partition lock, the
//! conflict checks and the write all happen inside that one unit of work, which is committed
//! before any notice is enqueued. Returning early (any error) drops the store and rolls back.

use tracing::{info, instrument, warn};

use crate::api::models::schedules::{ListSchedulesQuery, ScheduleCreate, ScheduleUpdate};
use crate::db::Store;
use crate::db::errors::DbError;
use crate::db::handlers::{Repository, ScheduleFilter};
use crate::db::models::{
    courses::CourseDBResponse,
    lab_rooms::LabRoomDBResponse,
    schedules::{ScheduleCreateDBRequest, ScheduleDBResponse, ScheduleUpdateDBRequest},
    sections::SectionDBResponse,
    semesters::SemesterDBResponse,
    users::UserDBResponse,
};
use crate::errors::{Error, Result};
use crate::notifications::{Notice, NotificationSink};
use crate::scheduling::conflicts::{Candidate, ConflictDimension, TimeSlot, ensure_no_conflicts};
use crate::types::{Actor, CourseId, LabRoomId, Permission, ScheduleId, SectionId, SemesterId, UserId};
use crate::validation::{RequiredFields, format_time, parse_day, parse_time, present};

pub const ASSIGNED_TITLE: &str = "New Schedule Assigned";
pub const REASSIGNED_TITLE: &str = "Schedule Assignment";
pub const CANCELLED_TITLE: &str = "Schedule Cancelled";

/// Semester id accepted by list filters for a semester that is still being drafted
const DRAFT_SEMESTER: &str = "new";

fn require_scheduling_control(actor: &Actor) -> Result<()> {
    if actor.can(Permission::FullSchedulingControl) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Some(Permission::FullSchedulingControl),
            resource: "schedules".to_string(),
        })
    }
}

/// An exclusion constraint firing on write means a concurrent booking slipped past the check
fn map_write_error(err: DbError) -> Error {
    let dimension = match &err {
        DbError::ExclusionViolation { constraint, .. } => constraint.as_deref().and_then(ConflictDimension::from_constraint),
        _ => None,
    };
    match dimension {
        Some(dimension) => Error::Conflict {
            dimension,
            conflicting: vec![],
        },
        None => Error::Database(err),
    }
}

/// The catalog rows a booking points at
struct References {
    semester: SemesterDBResponse,
    course: CourseDBResponse,
    section: SectionDBResponse,
    lab_room: LabRoomDBResponse,
    instructor: UserDBResponse,
}

/// Which references must also be active
#[derive(Clone, Copy)]
struct ActiveChecks {
    semester: bool,
    lab_room: bool,
    instructor: bool,
}

impl ActiveChecks {
    const ALL: ActiveChecks = ActiveChecks {
        semester: true,
        lab_room: true,
        instructor: true,
    };
}

fn inactive(field: &str, message: String) -> Error {
    Error::Validation {
        message,
        fields: vec![field.to_string()],
    }
}

impl References {
    async fn load(
        store: &mut dyn Store,
        semester_id: SemesterId,
        course_id: CourseId,
        section_id: SectionId,
        lab_room_id: LabRoomId,
        instructor_id: UserId,
    ) -> Result<Self> {
        let semester = store
            .semesters()
            .get_by_id(semester_id)
            .await?
            .ok_or_else(|| Error::not_found("Semester", semester_id))?;
        let course = store
            .courses()
            .get_by_id(course_id)
            .await?
            .ok_or_else(|| Error::not_found("Course", course_id))?;
        let section = store
            .sections()
            .get_by_id(section_id)
            .await?
            .ok_or_else(|| Error::not_found("Section", section_id))?;
        let lab_room = store
            .lab_rooms()
            .get_by_id(lab_room_id)
            .await?
            .ok_or_else(|| Error::not_found("Lab room", lab_room_id))?;
        let instructor = store
            .users()
            .get_by_id(instructor_id)
            .await?
            .ok_or_else(|| Error::not_found("Instructor", instructor_id))?;

        Ok(Self {
            semester,
            course,
            section,
            lab_room,
            instructor,
        })
    }

    fn ensure_active(&self, checks: ActiveChecks) -> Result<()> {
        if checks.semester && !self.semester.is_active {
            return Err(inactive("semester_id", format!("Semester '{}' is not active", self.semester.name)));
        }
        if checks.lab_room && !self.lab_room.is_active {
            return Err(inactive("lab_room_id", format!("Lab room '{}' is not active", self.lab_room.name)));
        }
        if checks.instructor && !self.instructor.is_active {
            return Err(inactive(
                "instructor_id",
                format!("Instructor '{}' is not active", self.instructor.full_name()),
            ));
        }
        Ok(())
    }

    fn assignment_message(&self, schedule: &ScheduleDBResponse) -> String {
        format!(
            "You have been assigned to teach {} for {} in {} on {} from {} to {}.",
            self.course.code,
            self.section.display_name(),
            self.lab_room.name,
            schedule.day_of_week,
            format_time(schedule.start_time),
            format_time(schedule.end_time),
        )
    }
}

fn cancellation_message(course: &CourseDBResponse, section: &SectionDBResponse, schedule: &ScheduleDBResponse) -> String {
    format!(
        "Your schedule for {} with {} on {} from {} to {} has been cancelled.",
        course.code,
        section.display_name(),
        schedule.day_of_week,
        format_time(schedule.start_time),
        format_time(schedule.end_time),
    )
}

/// The single store write a checked mutation performs
enum ScheduleWrite<'a> {
    Insert(&'a ScheduleCreateDBRequest),
    Update(ScheduleId, &'a ScheduleUpdateDBRequest),
}

/// Lock the candidate's partition, check all three dimensions, then perform `write`.
async fn checked_write(
    store: &mut dyn Store,
    candidate: &Candidate,
    exclude_id: Option<ScheduleId>,
    write: ScheduleWrite<'_>,
) -> Result<ScheduleDBResponse> {
    let mut schedules = store.schedules();
    schedules.lock_partition(candidate.semester_id, candidate.day_of_week).await?;
    ensure_no_conflicts(schedules.as_mut(), candidate, exclude_id).await?;

    let written = match write {
        ScheduleWrite::Insert(request) => schedules.create(request).await,
        ScheduleWrite::Update(id, request) => schedules.update(id, request).await,
    };
    written.map_err(map_write_error)
}

/// Book a new weekly slot and notify its instructor.
#[instrument(skip(store, sink, actor, request), fields(actor_id = actor.id), err)]
pub async fn create_schedule(
    mut store: Box<dyn Store>,
    sink: &dyn NotificationSink,
    actor: &Actor,
    request: ScheduleCreate,
) -> Result<ScheduleDBResponse> {
    require_scheduling_control(actor)?;

    let mut required = RequiredFields::new();
    let semester_id = required.take("semester_id", request.semester_id);
    let course_id = required.take("course_id", request.course_id);
    let section_id = required.take("section_id", request.section_id);
    let lab_room_id = required.take("lab_room_id", request.lab_room_id);
    let instructor_id = required.take("instructor_id", request.instructor_id);
    let day_of_week = required.take("day_of_week", request.day_of_week);
    let start_time = required.take("start_time", request.start_time);
    let end_time = required.take("end_time", request.end_time);
    let is_lab = required.take("is_lab", request.is_lab);
    required.finish()?;

    let day_of_week = parse_day(&present(day_of_week, "day_of_week")?)?;
    let start_time = parse_time("start_time", &present(start_time, "start_time")?)?;
    let end_time = parse_time("end_time", &present(end_time, "end_time")?)?;
    let slot = TimeSlot::new(start_time, end_time)?;

    let db_request = ScheduleCreateDBRequest {
        semester_id: present(semester_id, "semester_id")?,
        course_id: present(course_id, "course_id")?,
        section_id: present(section_id, "section_id")?,
        lab_room_id: present(lab_room_id, "lab_room_id")?,
        instructor_id: present(instructor_id, "instructor_id")?,
        day_of_week,
        start_time,
        end_time,
        is_lab: present(is_lab, "is_lab")?,
        created_by: actor.id,
    };

    let references = References::load(
        store.as_mut(),
        db_request.semester_id,
        db_request.course_id,
        db_request.section_id,
        db_request.lab_room_id,
        db_request.instructor_id,
    )
    .await?;
    references.ensure_active(ActiveChecks::ALL)?;

    let candidate = Candidate {
        semester_id: db_request.semester_id,
        day_of_week,
        slot,
        lab_room_id: db_request.lab_room_id,
        section_id: db_request.section_id,
        instructor_id: db_request.instructor_id,
    };
    let created = checked_write(store.as_mut(), &candidate, None, ScheduleWrite::Insert(&db_request)).await?;
    store.commit().await?;

    info!(schedule_id = created.id, day = %created.day_of_week, "Created schedule");
    sink.enqueue(Notice::new(
        created.instructor_id,
        ASSIGNED_TITLE,
        references.assignment_message(&created),
    ));

    Ok(created)
}

/// Change any fields of a booking, re-validating the resulting record as a whole.
#[instrument(skip(store, sink, actor, request), fields(actor_id = actor.id), err)]
pub async fn update_schedule(
    mut store: Box<dyn Store>,
    sink: &dyn NotificationSink,
    actor: &Actor,
    id: ScheduleId,
    request: ScheduleUpdate,
) -> Result<ScheduleDBResponse> {
    require_scheduling_control(actor)?;

    // Row lock first: a concurrent update of this booking finishes before we read our base
    let existing = store
        .schedules()
        .get_for_update(id)
        .await?
        .ok_or_else(|| Error::not_found("Schedule", id))?;

    let update = ScheduleUpdateDBRequest {
        semester_id: request.semester_id,
        course_id: request.course_id,
        section_id: request.section_id,
        lab_room_id: request.lab_room_id,
        instructor_id: request.instructor_id,
        day_of_week: request.day_of_week.as_deref().map(parse_day).transpose()?,
        start_time: request.start_time.as_deref().map(|v| parse_time("start_time", v)).transpose()?,
        end_time: request.end_time.as_deref().map(|v| parse_time("end_time", v)).transpose()?,
        is_lab: request.is_lab,
    };
    let resulting = existing.with_update(&update);
    let slot = TimeSlot::new(resulting.start_time, resulting.end_time)?;

    let references = References::load(
        store.as_mut(),
        resulting.semester_id,
        resulting.course_id,
        resulting.section_id,
        resulting.lab_room_id,
        resulting.instructor_id,
    )
    .await?;
    // Only references being switched to must be active; an existing booking keeps its own
    references.ensure_active(ActiveChecks {
        semester: resulting.semester_id != existing.semester_id,
        lab_room: resulting.lab_room_id != existing.lab_room_id,
        instructor: resulting.instructor_id != existing.instructor_id,
    })?;

    let candidate = Candidate {
        semester_id: resulting.semester_id,
        day_of_week: resulting.day_of_week,
        slot,
        lab_room_id: resulting.lab_room_id,
        section_id: resulting.section_id,
        instructor_id: resulting.instructor_id,
    };
    let updated = checked_write(store.as_mut(), &candidate, Some(id), ScheduleWrite::Update(id, &update)).await?;
    store.commit().await?;

    info!(schedule_id = id, "Updated schedule");
    if updated.instructor_id != existing.instructor_id {
        sink.enqueue(Notice::new(
            updated.instructor_id,
            REASSIGNED_TITLE,
            references.assignment_message(&updated),
        ));
    }

    Ok(updated)
}

/// Remove a booking and tell its instructor it was cancelled.
#[instrument(skip(store, sink, actor), fields(actor_id = actor.id), err)]
pub async fn delete_schedule(mut store: Box<dyn Store>, sink: &dyn NotificationSink, actor: &Actor, id: ScheduleId) -> Result<()> {
    require_scheduling_control(actor)?;

    let existing = store
        .schedules()
        .get_for_update(id)
        .await?
        .ok_or_else(|| Error::not_found("Schedule", id))?;
    let course = store.courses().get_by_id(existing.course_id).await?;
    let section = store.sections().get_by_id(existing.section_id).await?;

    if !store.schedules().delete(id).await? {
        return Err(Error::not_found("Schedule", id));
    }
    store.commit().await?;
    info!(schedule_id = id, "Deleted schedule");

    match (course, section) {
        (Some(course), Some(section)) => sink.enqueue(Notice::new(
            existing.instructor_id,
            CANCELLED_TITLE,
            cancellation_message(&course, &section, &existing),
        )),
        _ => warn!(schedule_id = id, "Deleted schedule had a dangling course or section; no cancellation notice"),
    }

    Ok(())
}

#[instrument(skip(store), err)]
pub async fn get_schedule(mut store: Box<dyn Store>, id: ScheduleId) -> Result<ScheduleDBResponse> {
    store
        .schedules()
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Schedule", id))
}

/// Translate list query parameters into a store filter. `None` means nothing can match.
pub fn schedule_filter(query: &ListSchedulesQuery) -> Result<Option<ScheduleFilter>> {
    let semester_id = match query.semester_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(DRAFT_SEMESTER) => return Ok(None),
        Some(raw) => Some(raw.parse::<SemesterId>().map_err(|_| Error::Validation {
            message: format!("Invalid semester_id '{raw}'"),
            fields: vec!["semester_id".to_string()],
        })?),
    };
    let day_of_week = query.day_of_week.as_deref().map(parse_day).transpose()?;

    Ok(Some(ScheduleFilter {
        semester_id,
        day_of_week,
        section_id: query.section_id,
        lab_room_id: query.lab_room_id,
        instructor_id: query.instructor_id,
    }))
}

/// Bookings matching `query`, ordered by day, start time and id.
#[instrument(skip(store), err)]
pub async fn list_schedules(mut store: Box<dyn Store>, query: &ListSchedulesQuery) -> Result<Vec<ScheduleDBResponse>> {
    match schedule_filter(query)? {
        Some(filter) => Ok(store.schedules().list(&filter).await?),
        None => Ok(vec![]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::notifications::RecordingSink;
    use crate::test_utils::{Fixture, hm};
    use crate::types::DayOfWeek;

    async fn all_schedules(fx: &Fixture) -> Vec<ScheduleDBResponse> {
        list_schedules(fx.db.begin().await.unwrap(), &ListSchedulesQuery::default()).await.unwrap()
    }

    #[test_log::test(tokio::test)]
    async fn test_create_persists_and_notifies_instructor() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();

        let created = create_schedule(
            fx.db.begin().await.unwrap(),
            &sink,
            &fx.coordinator(),
            fx.create_request("Monday", "09:00", "10:30"),
        )
        .await
        .unwrap();

        assert_eq!(created.day_of_week, DayOfWeek::Monday);
        assert_eq!(created.start_time, hm("09:00"));
        assert_eq!(created.created_by, fx.coordinator_id);
        assert_eq!(all_schedules(&fx).await, vec![created.clone()]);

        let notices = sink.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].user_id, fx.instructor_id);
        assert_eq!(notices[0].title, "New Schedule Assigned");
        assert_eq!(
            notices[0].message,
            "You have been assigned to teach IT101 for BSIT-1A in L201 on Monday from 09:00 to 10:30."
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_room_overlap_names_existing_booking() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();
        let a = fx.schedule(DayOfWeek::Monday, "09:00", "10:30").await;

        let mut b = fx.create_request("Monday", "10:00", "11:00");
        b.section_id = Some(fx.other_section_id);
        b.instructor_id = Some(fx.other_instructor_id);

        match create_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), b).await {
            Err(Error::Conflict { dimension, conflicting }) => {
                assert_eq!(dimension, ConflictDimension::Room);
                assert_eq!(conflicting, vec![a]);
            }
            other => panic!("expected room conflict, got {other:?}"),
        }
        assert!(sink.notices().is_empty());
        assert_eq!(all_schedules(&fx).await.len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_section_overlap_in_another_room() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();
        fx.schedule(DayOfWeek::Monday, "09:00", "10:30").await;

        let mut c = fx.create_request("Monday", "09:30", "10:00");
        c.lab_room_id = Some(fx.other_room_id);
        c.instructor_id = Some(fx.other_instructor_id);

        let err = create_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), c)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Conflict {
                dimension: ConflictDimension::Section,
                ..
            }
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_instructor_only_overlap_is_rejected() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();
        fx.schedule(DayOfWeek::Wednesday, "13:00", "15:00").await;

        let mut request = fx.create_request("Wednesday", "14:00", "16:00");
        request.lab_room_id = Some(fx.other_room_id);
        request.section_id = Some(fx.other_section_id);

        let err = create_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), request)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Conflict {
                dimension: ConflictDimension::Instructor,
                ..
            }
        ));
        assert_eq!(err.user_message(), "Instructor schedule conflict detected");
    }

    #[test_log::test(tokio::test)]
    async fn test_touching_slots_and_other_days_are_accepted() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();
        fx.schedule(DayOfWeek::Monday, "09:00", "10:00").await;

        for (day, start, end) in [("Monday", "10:00", "11:00"), ("Monday", "08:00", "09:00"), ("Tuesday", "09:00", "10:00")] {
            create_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), fx.create_request(day, start, end))
                .await
                .unwrap();
        }
        assert_eq!(all_schedules(&fx).await.len(), 4);
    }

    #[test_log::test(tokio::test)]
    async fn test_inverted_range_persists_nothing() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();

        let err = create_schedule(
            fx.db.begin().await.unwrap(),
            &sink,
            &fx.coordinator(),
            fx.create_request("Monday", "11:00", "10:00"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Range { .. }));
        assert!(all_schedules(&fx).await.is_empty());
        assert!(sink.notices().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_create_input_errors() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();

        let missing = ScheduleCreate {
            semester_id: Some(fx.semester_id),
            ..Default::default()
        };
        match create_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), missing).await {
            Err(Error::Validation { fields, .. }) => assert_eq!(
                fields,
                vec![
                    "course_id",
                    "section_id",
                    "lab_room_id",
                    "instructor_id",
                    "day_of_week",
                    "start_time",
                    "end_time",
                    "is_lab"
                ]
            ),
            other => panic!("expected validation error, got {other:?}"),
        }

        let bad_day = fx.create_request("Caturday", "09:00", "10:00");
        let err = create_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), bad_day)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let bad_time = fx.create_request("Monday", "9am", "10:00");
        let err = create_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), bad_time)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Format { .. }));

        let mut unknown_room = fx.create_request("Monday", "09:00", "10:00");
        unknown_room.lab_room_id = Some(9999);
        let err = create_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), unknown_room)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn test_inactive_room_is_rejected() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();
        fx.deactivate_room(fx.room_id).await;

        let err = create_schedule(
            fx.db.begin().await.unwrap(),
            &sink,
            &fx.coordinator(),
            fx.create_request("Monday", "09:00", "10:00"),
        )
        .await
        .unwrap_err();
        match err {
            Error::Validation { fields, .. } => assert_eq!(fields, vec!["lab_room_id"]),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_mutations_require_scheduling_control() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();
        let existing = fx.schedule(DayOfWeek::Monday, "09:00", "10:00").await;

        let err = create_schedule(
            fx.db.begin().await.unwrap(),
            &sink,
            &fx.student(),
            fx.create_request("Tuesday", "09:00", "10:00"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InsufficientPermissions { .. }));

        let err = delete_schedule(fx.db.begin().await.unwrap(), &sink, &fx.student(), existing.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientPermissions { .. }));
        assert_eq!(all_schedules(&fx).await.len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_shrinking_a_slot_frees_the_room() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();
        let a = fx.schedule(DayOfWeek::Monday, "09:00", "10:30").await;

        let mut b = fx.create_request("Monday", "10:00", "11:00");
        b.section_id = Some(fx.other_section_id);
        b.instructor_id = Some(fx.other_instructor_id);
        assert!(
            create_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), b.clone())
                .await
                .is_err()
        );

        let shorter = ScheduleUpdate {
            end_time: Some("10:00".to_string()),
            ..Default::default()
        };
        let updated = update_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), a.id, shorter)
            .await
            .unwrap();
        assert_eq!(updated.end_time, hm("10:00"));
        // Same instructor: no notice
        assert!(sink.notices().is_empty());

        create_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), b)
            .await
            .unwrap();
    }

    #[test_log::test(tokio::test)]
    async fn test_day_only_update_never_conflicts_with_itself() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();
        let a = fx.schedule(DayOfWeek::Monday, "09:00", "10:30").await;

        let same_day = ScheduleUpdate {
            day_of_week: Some("Monday".to_string()),
            ..Default::default()
        };
        update_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), a.id, same_day)
            .await
            .unwrap();

        let move_day = ScheduleUpdate {
            day_of_week: Some("thursday".to_string()),
            ..Default::default()
        };
        let moved = update_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), a.id, move_day)
            .await
            .unwrap();
        assert_eq!(moved.day_of_week, DayOfWeek::Thursday);
        assert_eq!((moved.start_time, moved.end_time), (a.start_time, a.end_time));
    }

    #[test_log::test(tokio::test)]
    async fn test_update_checks_the_resulting_record() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();
        let a = fx.schedule(DayOfWeek::Monday, "09:00", "10:00").await;
        let b = fx.schedule(DayOfWeek::Monday, "10:00", "11:00").await;

        // Moving B's start earlier collides with A
        let earlier = ScheduleUpdate {
            start_time: Some("09:30".to_string()),
            ..Default::default()
        };
        let err = update_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), b.id, earlier)
            .await
            .unwrap_err();
        match err {
            Error::Conflict { conflicting, .. } => assert_eq!(conflicting, vec![a]),
            other => panic!("expected conflict, got {other:?}"),
        }

        // An end before the stored start is a range error
        let inverted = ScheduleUpdate {
            end_time: Some("09:00".to_string()),
            ..Default::default()
        };
        let err = update_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), b.id, inverted)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Range { .. }));

        let err = update_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), 9999, ScheduleUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn test_reassignment_notifies_new_instructor() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();
        let a = fx.schedule(DayOfWeek::Friday, "13:00", "14:30").await;

        let reassign = ScheduleUpdate {
            instructor_id: Some(fx.other_instructor_id),
            ..Default::default()
        };
        update_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), a.id, reassign)
            .await
            .unwrap();

        let notices = sink.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].user_id, fx.other_instructor_id);
        assert_eq!(notices[0].title, "Schedule Assignment");
        assert_eq!(
            notices[0].message,
            "You have been assigned to teach IT101 for BSIT-1A in L201 on Friday from 13:00 to 14:30."
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_sends_cancellation() {
        let fx = Fixture::seeded().await;
        let sink = RecordingSink::default();
        let a = fx.schedule(DayOfWeek::Tuesday, "07:30", "09:00").await;

        delete_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), a.id)
            .await
            .unwrap();
        assert!(all_schedules(&fx).await.is_empty());

        let notices = sink.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].user_id, fx.instructor_id);
        assert_eq!(notices[0].title, "Schedule Cancelled");
        assert_eq!(
            notices[0].message,
            "Your schedule for IT101 with BSIT-1A on Tuesday from 07:30 to 09:00 has been cancelled."
        );

        let err = delete_schedule(fx.db.begin().await.unwrap(), &sink, &fx.coordinator(), a.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn test_list_is_ordered_filtered_and_idempotent() {
        let fx = Fixture::seeded().await;
        let wed = fx.schedule(DayOfWeek::Wednesday, "08:00", "09:00").await;
        let mon_late = fx.schedule(DayOfWeek::Monday, "13:00", "14:00").await;
        let mon_early = fx.schedule(DayOfWeek::Monday, "08:00", "09:00").await;

        let everything = all_schedules(&fx).await;
        let ids: Vec<_> = everything.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![mon_early.id, mon_late.id, wed.id]);
        assert_eq!(all_schedules(&fx).await, everything);

        let monday = ListSchedulesQuery {
            semester_id: Some(fx.semester_id.to_string()),
            day_of_week: Some("monday".to_string()),
            ..Default::default()
        };
        let listed = list_schedules(fx.db.begin().await.unwrap(), &monday).await.unwrap();
        assert_eq!(listed, vec![mon_early, mon_late]);

        let drafting = ListSchedulesQuery {
            semester_id: Some("new".to_string()),
            ..Default::default()
        };
        assert!(list_schedules(fx.db.begin().await.unwrap(), &drafting).await.unwrap().is_empty());

        let garbage = ListSchedulesQuery {
            semester_id: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            list_schedules(fx.db.begin().await.unwrap(), &garbage).await,
            Err(Error::Validation { .. })
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_get_schedule() {
        let fx = Fixture::seeded().await;
        let a = fx.schedule(DayOfWeek::Monday, "09:00", "10:00").await;
        assert_eq!(get_schedule(fx.db.begin().await.unwrap(), a.id).await.unwrap(), a);
        assert!(matches!(
            get_schedule(fx.db.begin().await.unwrap(), a.id + 1).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_exclusion_violation_becomes_conflict() {
        let err = map_write_error(DbError::ExclusionViolation {
            constraint: Some("schedules_section_no_overlap".to_string()),
            table: Some("schedules".to_string()),
            message: String::new(),
        });
        match err {
            Error::Conflict { dimension, conflicting } => {
                assert_eq!(dimension, ConflictDimension::Section);
                assert!(conflicting.is_empty());
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        assert!(matches!(map_write_error(DbError::NotFound), Error::Database(DbError::NotFound)));
    }
    #[cfg(feature = "postgres-tests")]
    mod postgres {
        use super::*;
        use crate::db::PgDatabase;
        use sqlx::PgPool;
        use std::sync::Arc;
        use std::time::Duration;

        async fn seeded(pool: PgPool) -> Fixture {
            Fixture::seed(Arc::new(PgDatabase::new(pool))).await
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn test_booking_committed_during_insert_is_reported_as_conflict(pool: PgPool) {
            let fx = seeded(pool).await;

            // An overlapping room booking written without the partition lock, still uncommitted
            let mut rogue = fx.db.begin().await.unwrap();
            rogue
                .schedules()
                .create(&ScheduleCreateDBRequest {
                    semester_id: fx.semester_id,
                    course_id: fx.course_id,
                    section_id: fx.other_section_id,
                    lab_room_id: fx.room_id,
                    instructor_id: fx.other_instructor_id,
                    day_of_week: DayOfWeek::Friday,
                    start_time: hm("09:00"),
                    end_time: hm("10:00"),
                    is_lab: true,
                    created_by: fx.coordinator_id,
                })
                .await
                .unwrap();

            // The conflict check cannot see it, so the insert waits on the exclusion constraint
            let store = fx.db.begin().await.unwrap();
            let actor = fx.coordinator();
            let request = fx.create_request("Friday", "09:30", "10:30");
            let sink = Arc::new(RecordingSink::default());
            let task_sink = sink.clone();
            let pending = tokio::spawn(async move { create_schedule(store, task_sink.as_ref(), &actor, request).await });

            tokio::time::sleep(Duration::from_millis(250)).await;
            rogue.commit().await.unwrap();

            match pending.await.unwrap() {
                Err(Error::Conflict { dimension, conflicting }) => {
                    assert_eq!(dimension, ConflictDimension::Room);
                    assert!(conflicting.is_empty());
                }
                other => panic!("expected room conflict, got {other:?}"),
            }
            assert!(sink.notices().is_empty());
            assert_eq!(all_schedules(&fx).await.len(), 1);
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn test_update_checks_against_latest_committed_row(pool: PgPool) {
            let fx = seeded(pool).await;
            let a = fx.schedule(DayOfWeek::Monday, "09:00", "10:00").await;

            // B holds L202 on Tuesday with a different section and instructor
            let mut store = fx.db.begin().await.unwrap();
            let b = store
                .schedules()
                .create(&ScheduleCreateDBRequest {
                    semester_id: fx.semester_id,
                    course_id: fx.course_id,
                    section_id: fx.other_section_id,
                    lab_room_id: fx.other_room_id,
                    instructor_id: fx.other_instructor_id,
                    day_of_week: DayOfWeek::Tuesday,
                    start_time: hm("09:00"),
                    end_time: hm("10:00"),
                    is_lab: true,
                    created_by: fx.coordinator_id,
                })
                .await
                .unwrap();
            store.commit().await.unwrap();

            // First writer locks A and moves it to Tuesday
            let mut first = fx.db.begin().await.unwrap();
            first.schedules().get_for_update(a.id).await.unwrap().unwrap();

            // Second writer moves A into L202; it must see Tuesday once the first commits
            let store = fx.db.begin().await.unwrap();
            let actor = fx.coordinator();
            let sink = Arc::new(RecordingSink::default());
            let task_sink = sink.clone();
            let id = a.id;
            let to_other_room = ScheduleUpdate {
                lab_room_id: Some(fx.other_room_id),
                ..Default::default()
            };
            let pending =
                tokio::spawn(async move { update_schedule(store, task_sink.as_ref(), &actor, id, to_other_room).await });

            tokio::time::sleep(Duration::from_millis(250)).await;
            first
                .schedules()
                .update(
                    a.id,
                    &ScheduleUpdateDBRequest {
                        day_of_week: Some(DayOfWeek::Tuesday),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            first.commit().await.unwrap();

            match pending.await.unwrap() {
                Err(Error::Conflict { dimension, conflicting }) => {
                    assert_eq!(dimension, ConflictDimension::Room);
                    assert_eq!(conflicting, vec![b]);
                }
                other => panic!("expected room conflict, got {other:?}"),
            }
        }
    }
}
