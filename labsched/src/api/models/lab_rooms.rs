//! API request/response models for lab rooms.

use crate::db::models::lab_rooms::{LabRoomDBResponse, LabRoomUpdateDBRequest};
use crate::types::LabRoomId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LabRoomCreate {
    #[schema(example = "L201")]
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub description: Option<String>,
    /// Defaults to true
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LabRoomUpdate {
    pub capacity: Option<i32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl From<LabRoomUpdate> for LabRoomUpdateDBRequest {
    fn from(update: LabRoomUpdate) -> Self {
        Self {
            capacity: update.capacity,
            description: update.description,
            is_active: update.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabRoomResponse {
    pub id: LabRoomId,
    pub name: String,
    pub capacity: i32,
    pub description: String,
    pub is_active: bool,
}

impl From<LabRoomDBResponse> for LabRoomResponse {
    fn from(db: LabRoomDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            capacity: db.capacity,
            description: db.description,
            is_active: db.is_active,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListLabRoomsQuery {
    /// Exact room name
    pub name: Option<String>,
    #[serde(default)]
    pub active_only: bool,
}
