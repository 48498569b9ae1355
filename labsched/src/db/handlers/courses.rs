//! Repository for courses.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::courses::{CourseCreateDBRequest, CourseDBResponse, CourseUpdateDBRequest},
    },
    types::CourseId,
};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing courses
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    /// Exact course code
    pub code: Option<String>,
}

impl CourseFilter {
    pub fn matches(&self, course: &CourseDBResponse) -> bool {
        self.code.as_deref().is_none_or(|code| course.code == code)
    }
}

/// Course storage. Codes are unique; listing is ordered by code.
pub trait CourseRepository:
    Repository<
        CreateRequest = CourseCreateDBRequest,
        UpdateRequest = CourseUpdateDBRequest,
        Response = CourseDBResponse,
        Id = CourseId,
        Filter = CourseFilter,
    >
{
}

#[derive(Debug, Clone, FromRow)]
struct Course {
    pub id: CourseId,
    pub code: String,
    pub name: String,
    pub description: String,
    pub units: i32,
}

impl From<Course> for CourseDBResponse {
    fn from(c: Course) -> Self {
        Self {
            id: c.id,
            code: c.code,
            name: c.name,
            description: c.description,
            units: c.units,
        }
    }
}

pub struct Courses<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Courses<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Courses<'c> {
    type CreateRequest = CourseCreateDBRequest;
    type UpdateRequest = CourseUpdateDBRequest;
    type Response = CourseDBResponse;
    type Id = CourseId;
    type Filter = CourseFilter;

    #[instrument(skip(self, request), fields(code = %request.code), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO courses (code, name, description, units) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&request.code)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.units)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(CourseDBResponse::from(course))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(course.map(CourseDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(code = ?filter.code), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM courses WHERE 1=1");
        if let Some(code) = &filter.code {
            query.push(" AND code = ");
            query.push_bind(code.clone());
        }
        query.push(" ORDER BY code");

        let courses = query.build_query_as::<Course>().fetch_all(&mut *self.db).await?;

        Ok(courses.into_iter().map(CourseDBResponse::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                units = COALESCE($4, units)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.name.as_deref())
        .bind(request.description.as_deref())
        .bind(request.units)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(CourseDBResponse::from(course))
    }
}

impl<'c> CourseRepository for Courses<'c> {}
