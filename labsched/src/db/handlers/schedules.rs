//! Repository for schedules.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::schedules::{ScheduleCreateDBRequest, ScheduleDBResponse, ScheduleUpdateDBRequest},
    },
    types::{CourseId, DayOfWeek, LabRoomId, ScheduleId, SectionId, SemesterId, UserId},
};
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing schedules. Every field narrows the result; `None` means "any".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleFilter {
    pub semester_id: Option<SemesterId>,
    pub day_of_week: Option<DayOfWeek>,
    pub section_id: Option<SectionId>,
    pub lab_room_id: Option<LabRoomId>,
    pub instructor_id: Option<UserId>,
}

impl ScheduleFilter {
    /// Schedules sharing a (semester, day) partition
    pub fn partition(semester_id: SemesterId, day_of_week: DayOfWeek) -> Self {
        Self {
            semester_id: Some(semester_id),
            day_of_week: Some(day_of_week),
            ..Default::default()
        }
    }

    pub fn matches(&self, schedule: &ScheduleDBResponse) -> bool {
        self.semester_id.is_none_or(|id| schedule.semester_id == id)
            && self.day_of_week.is_none_or(|day| schedule.day_of_week == day)
            && self.section_id.is_none_or(|id| schedule.section_id == id)
            && self.lab_room_id.is_none_or(|id| schedule.lab_room_id == id)
            && self.instructor_id.is_none_or(|id| schedule.instructor_id == id)
    }
}

/// Schedule storage. Listing is ordered by (day, start time, id).
#[async_trait::async_trait]
pub trait ScheduleRepository:
    Repository<
        CreateRequest = ScheduleCreateDBRequest,
        UpdateRequest = ScheduleUpdateDBRequest,
        Response = ScheduleDBResponse,
        Id = ScheduleId,
        Filter = ScheduleFilter,
    >
{
    /// Serialize writers on one (semester, day) partition until the unit of work ends.
    async fn lock_partition(&mut self, semester_id: SemesterId, day_of_week: DayOfWeek) -> Result<()>;

    /// Read a schedule and hold a row lock on it until the unit of work ends. Concurrent
    /// writers to the same row wait here and then see its latest committed state.
    async fn get_for_update(&mut self, id: ScheduleId) -> Result<Option<ScheduleDBResponse>>;
}

/// Advisory lock key for a partition, unique per (semester, day)
pub(crate) fn partition_lock_key(semester_id: SemesterId, day_of_week: DayOfWeek) -> i64 {
    semester_id.wrapping_mul(7).wrapping_add(day_of_week.index())
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Schedule {
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

impl From<Schedule> for ScheduleDBResponse {
    fn from(s: Schedule) -> Self {
        Self {
            id: s.id,
            semester_id: s.semester_id,
            course_id: s.course_id,
            section_id: s.section_id,
            lab_room_id: s.lab_room_id,
            instructor_id: s.instructor_id,
            day_of_week: s.day_of_week,
            start_time: s.start_time,
            end_time: s.end_time,
            is_lab: s.is_lab,
            created_by: s.created_by,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

pub struct Schedules<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Schedules<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Schedules<'c> {
    type CreateRequest = ScheduleCreateDBRequest;
    type UpdateRequest = ScheduleUpdateDBRequest;
    type Response = ScheduleDBResponse;
    type Id = ScheduleId;
    type Filter = ScheduleFilter;

    #[instrument(skip(self, request), fields(semester_id = request.semester_id, day = %request.day_of_week), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedules (semester_id, course_id, section_id, lab_room_id, instructor_id, day_of_week, start_time, end_time, is_lab, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(request.semester_id)
        .bind(request.course_id)
        .bind(request.section_id)
        .bind(request.lab_room_id)
        .bind(request.instructor_id)
        .bind(request.day_of_week)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.is_lab)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ScheduleDBResponse::from(schedule))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let schedule = sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(schedule.map(ScheduleDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(semester_id = ?filter.semester_id, day = ?filter.day_of_week), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM schedules WHERE 1=1");

        if let Some(semester_id) = filter.semester_id {
            query.push(" AND semester_id = ");
            query.push_bind(semester_id);
        }
        if let Some(day_of_week) = filter.day_of_week {
            query.push(" AND day_of_week = ");
            query.push_bind(day_of_week);
        }
        if let Some(section_id) = filter.section_id {
            query.push(" AND section_id = ");
            query.push_bind(section_id);
        }
        if let Some(lab_room_id) = filter.lab_room_id {
            query.push(" AND lab_room_id = ");
            query.push_bind(lab_room_id);
        }
        if let Some(instructor_id) = filter.instructor_id {
            query.push(" AND instructor_id = ");
            query.push_bind(instructor_id);
        }

        query.push(" ORDER BY day_of_week, start_time, id");

        let schedules = query.build_query_as::<Schedule>().fetch_all(&mut *self.db).await?;

        Ok(schedules.into_iter().map(ScheduleDBResponse::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            UPDATE schedules SET
                semester_id = COALESCE($2, semester_id),
                course_id = COALESCE($3, course_id),
                section_id = COALESCE($4, section_id),
                lab_room_id = COALESCE($5, lab_room_id),
                instructor_id = COALESCE($6, instructor_id),
                day_of_week = COALESCE($7, day_of_week),
                start_time = COALESCE($8, start_time),
                end_time = COALESCE($9, end_time),
                is_lab = COALESCE($10, is_lab),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.semester_id)
        .bind(request.course_id)
        .bind(request.section_id)
        .bind(request.lab_room_id)
        .bind(request.instructor_id)
        .bind(request.day_of_week)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.is_lab)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(ScheduleDBResponse::from(schedule))
    }
}

#[async_trait::async_trait]
impl<'c> ScheduleRepository for Schedules<'c> {
    #[instrument(skip(self), err)]
    async fn lock_partition(&mut self, semester_id: SemesterId, day_of_week: DayOfWeek) -> Result<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(partition_lock_key(semester_id, day_of_week))
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get_for_update(&mut self, id: ScheduleId) -> Result<Option<ScheduleDBResponse>> {
        let schedule = sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(schedule.map(ScheduleDBResponse::from))
    }
}
