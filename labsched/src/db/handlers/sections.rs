//! Repository for sections.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::sections::{SectionCreateDBRequest, SectionDBResponse, SectionUpdateDBRequest},
    },
    types::SectionId,
};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing sections
#[derive(Debug, Clone, Default)]
pub struct SectionFilter {
    pub program: Option<String>,
    pub name: Option<String>,
}

impl SectionFilter {
    pub fn matches(&self, section: &SectionDBResponse) -> bool {
        self.program.as_deref().is_none_or(|program| section.program == program)
            && self.name.as_deref().is_none_or(|name| section.name == name)
    }
}

/// Section storage. Listing is ordered by (program, year level, name).
pub trait SectionRepository:
    Repository<
        CreateRequest = SectionCreateDBRequest,
        UpdateRequest = SectionUpdateDBRequest,
        Response = SectionDBResponse,
        Id = SectionId,
        Filter = SectionFilter,
    >
{
}

#[derive(Debug, Clone, FromRow)]
struct Section {
    pub id: SectionId,
    pub name: String,
    pub program: String,
    pub year_level: i32,
}

impl From<Section> for SectionDBResponse {
    fn from(s: Section) -> Self {
        Self {
            id: s.id,
            name: s.name,
            program: s.program,
            year_level: s.year_level,
        }
    }
}

pub struct Sections<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Sections<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Sections<'c> {
    type CreateRequest = SectionCreateDBRequest;
    type UpdateRequest = SectionUpdateDBRequest;
    type Response = SectionDBResponse;
    type Id = SectionId;
    type Filter = SectionFilter;

    #[instrument(skip(self, request), fields(program = %request.program, name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let section = sqlx::query_as::<_, Section>("INSERT INTO sections (name, program, year_level) VALUES ($1, $2, $3) RETURNING *")
            .bind(&request.name)
            .bind(&request.program)
            .bind(request.year_level)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(SectionDBResponse::from(section))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let section = sqlx::query_as::<_, Section>("SELECT * FROM sections WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(section.map(SectionDBResponse::from))
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM sections WHERE 1=1");
        if let Some(program) = &filter.program {
            query.push(" AND program = ");
            query.push_bind(program.clone());
        }
        if let Some(name) = &filter.name {
            query.push(" AND name = ");
            query.push_bind(name.clone());
        }
        query.push(" ORDER BY program, year_level, name, id");

        let sections = query.build_query_as::<Section>().fetch_all(&mut *self.db).await?;

        Ok(sections.into_iter().map(SectionDBResponse::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let section = sqlx::query_as::<_, Section>(
            r#"
            UPDATE sections SET
                name = COALESCE($2, name),
                program = COALESCE($3, program),
                year_level = COALESCE($4, year_level)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.name.as_deref())
        .bind(request.program.as_deref())
        .bind(request.year_level)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(SectionDBResponse::from(section))
    }
}

impl<'c> SectionRepository for Sections<'c> {}
