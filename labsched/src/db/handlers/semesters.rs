//! Repository for semesters.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::semesters::{SemesterCreateDBRequest, SemesterDBResponse, SemesterUpdateDBRequest},
    },
    types::SemesterId,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing semesters
#[derive(Debug, Clone, Default)]
pub struct SemesterFilter {
    pub active_only: bool,
}

impl SemesterFilter {
    pub fn matches(&self, semester: &SemesterDBResponse) -> bool {
        !self.active_only || semester.is_active
    }
}

/// Semester storage. Listing is ordered newest start date first.
pub trait SemesterRepository:
    Repository<
        CreateRequest = SemesterCreateDBRequest,
        UpdateRequest = SemesterUpdateDBRequest,
        Response = SemesterDBResponse,
        Id = SemesterId,
        Filter = SemesterFilter,
    >
{
}

#[derive(Debug, Clone, FromRow)]
struct Semester {
    pub id: SemesterId,
    pub name: String,
    pub school_year: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Semester> for SemesterDBResponse {
    fn from(s: Semester) -> Self {
        Self {
            id: s.id,
            name: s.name,
            school_year: s.school_year,
            start_date: s.start_date,
            end_date: s.end_date,
            is_active: s.is_active,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

pub struct Semesters<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Semesters<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Semesters<'c> {
    type CreateRequest = SemesterCreateDBRequest;
    type UpdateRequest = SemesterUpdateDBRequest;
    type Response = SemesterDBResponse;
    type Id = SemesterId;
    type Filter = SemesterFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let semester = sqlx::query_as::<_, Semester>(
            r#"
            INSERT INTO semesters (name, school_year, start_date, end_date, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.school_year)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(SemesterDBResponse::from(semester))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let semester = sqlx::query_as::<_, Semester>("SELECT * FROM semesters WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(semester.map(SemesterDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(active_only = filter.active_only), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM semesters WHERE 1=1");
        if filter.active_only {
            query.push(" AND is_active");
        }
        query.push(" ORDER BY start_date DESC, id DESC");

        let semesters = query.build_query_as::<Semester>().fetch_all(&mut *self.db).await?;

        Ok(semesters.into_iter().map(SemesterDBResponse::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM semesters WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let semester = sqlx::query_as::<_, Semester>(
            r#"
            UPDATE semesters SET
                name = COALESCE($2, name),
                school_year = COALESCE($3, school_year),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.name.as_deref())
        .bind(request.school_year.as_deref())
        .bind(request.is_active)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(SemesterDBResponse::from(semester))
    }
}

impl<'c> SemesterRepository for Semesters<'c> {}
