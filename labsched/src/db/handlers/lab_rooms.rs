//! Repository for lab rooms.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::lab_rooms::{LabRoomCreateDBRequest, LabRoomDBResponse, LabRoomUpdateDBRequest},
    },
    types::LabRoomId,
};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing lab rooms
#[derive(Debug, Clone, Default)]
pub struct LabRoomFilter {
    /// Exact room name
    pub name: Option<String>,
    pub active_only: bool,
}

impl LabRoomFilter {
    pub fn matches(&self, room: &LabRoomDBResponse) -> bool {
        self.name.as_deref().is_none_or(|name| room.name == name) && (!self.active_only || room.is_active)
    }
}

/// Lab room storage. Names are unique; listing is ordered by name.
pub trait LabRoomRepository:
    Repository<
        CreateRequest = LabRoomCreateDBRequest,
        UpdateRequest = LabRoomUpdateDBRequest,
        Response = LabRoomDBResponse,
        Id = LabRoomId,
        Filter = LabRoomFilter,
    >
{
}

#[derive(Debug, Clone, FromRow)]
struct LabRoom {
    pub id: LabRoomId,
    pub name: String,
    pub capacity: i32,
    pub description: String,
    pub is_active: bool,
}

impl From<LabRoom> for LabRoomDBResponse {
    fn from(r: LabRoom) -> Self {
        Self {
            id: r.id,
            name: r.name,
            capacity: r.capacity,
            description: r.description,
            is_active: r.is_active,
        }
    }
}

pub struct LabRooms<'c> {
    db: &'c mut PgConnection,
}

impl<'c> LabRooms<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for LabRooms<'c> {
    type CreateRequest = LabRoomCreateDBRequest;
    type UpdateRequest = LabRoomUpdateDBRequest;
    type Response = LabRoomDBResponse;
    type Id = LabRoomId;
    type Filter = LabRoomFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let room = sqlx::query_as::<_, LabRoom>(
            "INSERT INTO lab_rooms (name, capacity, description, is_active) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&request.name)
        .bind(request.capacity)
        .bind(&request.description)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(LabRoomDBResponse::from(room))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let room = sqlx::query_as::<_, LabRoom>("SELECT * FROM lab_rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(room.map(LabRoomDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(name = ?filter.name), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM lab_rooms WHERE 1=1");
        if let Some(name) = &filter.name {
            query.push(" AND name = ");
            query.push_bind(name.clone());
        }
        if filter.active_only {
            query.push(" AND is_active");
        }
        query.push(" ORDER BY name");

        let rooms = query.build_query_as::<LabRoom>().fetch_all(&mut *self.db).await?;

        Ok(rooms.into_iter().map(LabRoomDBResponse::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lab_rooms WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let room = sqlx::query_as::<_, LabRoom>(
            r#"
            UPDATE lab_rooms SET
                capacity = COALESCE($2, capacity),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.capacity)
        .bind(request.description.as_deref())
        .bind(request.is_active)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(LabRoomDBResponse::from(room))
    }
}

impl<'c> LabRoomRepository for LabRooms<'c> {}
