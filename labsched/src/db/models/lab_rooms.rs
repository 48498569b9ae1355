//! Store models for lab rooms.

use crate::types::LabRoomId;

#[derive(Debug, Clone)]
pub struct LabRoomCreateDBRequest {
    pub name: String,
    pub capacity: i32,
    pub description: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LabRoomUpdateDBRequest {
    pub capacity: Option<i32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabRoomDBResponse {
    pub id: LabRoomId,
    pub name: String,
    pub capacity: i32,
    pub description: String,
    pub is_active: bool,
}
