//! Booking conflict detection.
//!
//! Two bookings collide when they share a semester, a day, and one of the three resources a slot
//! occupies (room, section, instructor), and their half-open time intervals `[start, end)`
//! intersect. Slots that merely touch (one ends at 10:00, the next starts at 10:00) do not
//! collide.
//!
//! The interval test is the pure [`TimeSlot::overlaps`]; [`find_conflicts`] applies it to the
//! partition fetched from the open unit of work, and [`ensure_no_conflicts`] runs the three
//! dimensions in order and turns the first hit into [`Error::Conflict`].

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::db::errors::Result as DbResult;
use crate::db::handlers::{ScheduleFilter, ScheduleRepository};
use crate::db::models::schedules::ScheduleDBResponse;
use crate::errors::{Error, Result};
use crate::types::{DayOfWeek, LabRoomId, ScheduleId, SectionId, SemesterId, UserId};
use crate::validation::format_time;

/// The resource two overlapping bookings compete for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConflictDimension {
    Room,
    Section,
    Instructor,
}

impl ConflictDimension {
    /// Order in which dimensions are checked; the first collision is reported
    pub const CHECK_ORDER: [ConflictDimension; 3] = [ConflictDimension::Room, ConflictDimension::Section, ConflictDimension::Instructor];

    /// Maps a schedules exclusion constraint back to the dimension it guards
    pub fn from_constraint(constraint: &str) -> Option<Self> {
        match constraint {
            "schedules_room_no_overlap" => Some(ConflictDimension::Room),
            "schedules_section_no_overlap" => Some(ConflictDimension::Section),
            "schedules_instructor_no_overlap" => Some(ConflictDimension::Instructor),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ConflictDimension::Room => "Schedule conflict detected",
            ConflictDimension::Section => "Section schedule conflict detected",
            ConflictDimension::Instructor => "Instructor schedule conflict detected",
        }
    }
}

impl fmt::Display for ConflictDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConflictDimension::Room => "room",
            ConflictDimension::Section => "section",
            ConflictDimension::Instructor => "instructor",
        };
        f.write_str(name)
    }
}

/// A half-open interval `[start, end)` within one day. Always non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeSlot {
    /// Fails with [`Error::Range`] unless `start < end`
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(Error::Range {
                message: format!(
                    "Start time must be before end time (got {} to {})",
                    format_time(start),
                    format_time(end)
                ),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && self.end > other.start
    }
}

impl From<&ScheduleDBResponse> for TimeSlot {
    /// Stored schedules satisfy `start < end` (checked on write, and by a table constraint)
    fn from(schedule: &ScheduleDBResponse) -> Self {
        Self {
            start: schedule.start_time,
            end: schedule.end_time,
        }
    }
}

/// A proposed booking, as the conflict checker sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub semester_id: SemesterId,
    pub day_of_week: DayOfWeek,
    pub slot: TimeSlot,
    pub lab_room_id: LabRoomId,
    pub section_id: SectionId,
    pub instructor_id: UserId,
}

impl Candidate {
    /// The partition of existing bookings that can collide with this one on `dimension`
    pub fn filter(&self, dimension: ConflictDimension) -> ScheduleFilter {
        let mut filter = ScheduleFilter::partition(self.semester_id, self.day_of_week);
        match dimension {
            ConflictDimension::Room => filter.lab_room_id = Some(self.lab_room_id),
            ConflictDimension::Section => filter.section_id = Some(self.section_id),
            ConflictDimension::Instructor => filter.instructor_id = Some(self.instructor_id),
        }
        filter
    }
}

/// Bookings in `existing` whose slot overlaps `slot`, skipping `exclude_id`.
pub fn overlapping<'a>(
    slot: &TimeSlot,
    existing: impl IntoIterator<Item = &'a ScheduleDBResponse>,
    exclude_id: Option<ScheduleId>,
) -> Vec<ScheduleDBResponse> {
    existing
        .into_iter()
        .filter(|s| Some(s.id) != exclude_id)
        .filter(|s| slot.overlaps(&TimeSlot::from(*s)))
        .cloned()
        .collect()
}

/// Existing bookings that collide with `candidate` on one dimension.
#[instrument(skip(schedules, candidate), fields(semester_id = candidate.semester_id, day = %candidate.day_of_week), err)]
pub async fn find_conflicts(
    schedules: &mut dyn ScheduleRepository,
    candidate: &Candidate,
    dimension: ConflictDimension,
    exclude_id: Option<ScheduleId>,
) -> DbResult<Vec<ScheduleDBResponse>> {
    let partition = schedules.list(&candidate.filter(dimension)).await?;
    Ok(overlapping(&candidate.slot, &partition, exclude_id))
}

/// Runs room, section and instructor checks in order; the first collision wins.
pub async fn ensure_no_conflicts(
    schedules: &mut dyn ScheduleRepository,
    candidate: &Candidate,
    exclude_id: Option<ScheduleId>,
) -> Result<()> {
    for dimension in ConflictDimension::CHECK_ORDER {
        let conflicting = find_conflicts(schedules, candidate, dimension, exclude_id).await?;
        if !conflicting.is_empty() {
            debug!(%dimension, count = conflicting.len(), "Rejecting overlapping booking");
            return Err(Error::Conflict { dimension, conflicting });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::test_utils::{Fixture, hm};
    use rstest::rstest;

    fn slot(start: &str, end: &str) -> TimeSlot {
        TimeSlot::new(hm(start), hm(end)).unwrap()
    }

    #[rstest]
    #[case("09:00", "10:00", "10:00", "11:00", false)]
    #[case("10:00", "11:00", "09:00", "10:00", false)]
    #[case("09:00", "10:30", "10:00", "11:00", true)]
    #[case("09:00", "12:00", "10:00", "11:00", true)]
    #[case("10:00", "11:00", "09:00", "12:00", true)]
    #[case("09:00", "10:00", "09:00", "10:00", true)]
    #[case("07:00", "08:00", "13:00", "14:00", false)]
    fn test_overlap_is_half_open(#[case] s1: &str, #[case] e1: &str, #[case] s2: &str, #[case] e2: &str, #[case] expected: bool) {
        let a = slot(s1, e1);
        let b = slot(s2, e2);
        assert_eq!(a.overlaps(&b), expected);
        // Symmetric
        assert_eq!(b.overlaps(&a), expected);
    }

    #[test]
    fn test_overlap_matches_predicate_on_minute_grid() {
        let minutes = [0, 30, 59, 60, 61, 90, 120];
        let at = |m: u32| NaiveTime::from_hms_opt(8 + m / 60, m % 60, 0).unwrap();
        for &s1 in &minutes {
            for &e1 in minutes.iter().filter(|&&e| e > s1) {
                for &s2 in &minutes {
                    for &e2 in minutes.iter().filter(|&&e| e > s2) {
                        let a = TimeSlot::new(at(s1), at(e1)).unwrap();
                        let b = TimeSlot::new(at(s2), at(e2)).unwrap();
                        assert_eq!(a.overlaps(&b), s1 < e2 && e1 > s2, "[{s1},{e1}) vs [{s2},{e2})");
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_or_inverted_slots_are_range_errors() {
        assert!(matches!(TimeSlot::new(hm("11:00"), hm("10:00")), Err(Error::Range { .. })));
        assert!(matches!(TimeSlot::new(hm("10:00"), hm("10:00")), Err(Error::Range { .. })));
    }

    #[test]
    fn test_dimension_from_constraint() {
        assert_eq!(ConflictDimension::from_constraint("schedules_room_no_overlap"), Some(ConflictDimension::Room));
        assert_eq!(
            ConflictDimension::from_constraint("schedules_instructor_no_overlap"),
            Some(ConflictDimension::Instructor)
        );
        assert_eq!(ConflictDimension::from_constraint("users_email_key"), None);
    }

    #[tokio::test]
    async fn test_find_conflicts_scopes_by_partition_and_excludes_self() {
        let fx = Fixture::seeded().await;
        let existing = fx.schedule(DayOfWeek::Monday, "09:00", "10:30").await;

        let mut store = fx.db.begin().await.unwrap();
        let mut schedules = store.schedules();

        let candidate = Candidate {
            semester_id: fx.semester_id,
            day_of_week: DayOfWeek::Monday,
            slot: slot("10:00", "11:00"),
            lab_room_id: fx.room_id,
            section_id: fx.other_section_id,
            instructor_id: fx.other_instructor_id,
        };

        let room = find_conflicts(schedules.as_mut(), &candidate, ConflictDimension::Room, None).await.unwrap();
        assert_eq!(room.iter().map(|s| s.id).collect::<Vec<_>>(), vec![existing.id]);

        let section = find_conflicts(schedules.as_mut(), &candidate, ConflictDimension::Section, None)
            .await
            .unwrap();
        assert!(section.is_empty());

        // Its own record is never a conflict
        let excluded = find_conflicts(schedules.as_mut(), &candidate, ConflictDimension::Room, Some(existing.id))
            .await
            .unwrap();
        assert!(excluded.is_empty());

        // Another day never conflicts
        let tuesday = Candidate {
            day_of_week: DayOfWeek::Tuesday,
            ..candidate
        };
        let other_day = find_conflicts(schedules.as_mut(), &tuesday, ConflictDimension::Room, None).await.unwrap();
        assert!(other_day.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_no_conflicts_reports_first_dimension() {
        let fx = Fixture::seeded().await;
        fx.schedule(DayOfWeek::Monday, "09:00", "10:30").await;

        let mut store = fx.db.begin().await.unwrap();
        let mut schedules = store.schedules();

        // Same room and same instructor: room is checked first
        let candidate = Candidate {
            semester_id: fx.semester_id,
            day_of_week: DayOfWeek::Monday,
            slot: slot("10:00", "11:00"),
            lab_room_id: fx.room_id,
            section_id: fx.other_section_id,
            instructor_id: fx.instructor_id,
        };
        match ensure_no_conflicts(schedules.as_mut(), &candidate, None).await {
            Err(Error::Conflict { dimension, conflicting }) => {
                assert_eq!(dimension, ConflictDimension::Room);
                assert_eq!(conflicting.len(), 1);
            }
            other => panic!("expected room conflict, got {other:?}"),
        }

        let clear = Candidate {
            slot: slot("10:30", "12:00"),
            ..candidate
        };
        assert!(ensure_no_conflicts(schedules.as_mut(), &clear, None).await.is_ok());
    }
}
