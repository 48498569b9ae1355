//! API request/response models for courses.

use crate::db::models::courses::{CourseDBResponse, CourseUpdateDBRequest};
use crate::types::CourseId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CourseCreate {
    #[schema(example = "IT101")]
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub units: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CourseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub units: Option<i32>,
}

impl From<CourseUpdate> for CourseUpdateDBRequest {
    fn from(update: CourseUpdate) -> Self {
        Self {
            name: update.name,
            description: update.description,
            units: update.units,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    pub id: CourseId,
    pub code: String,
    pub name: String,
    pub description: String,
    pub units: i32,
}

impl From<CourseDBResponse> for CourseResponse {
    fn from(db: CourseDBResponse) -> Self {
        Self {
            id: db.id,
            code: db.code,
            name: db.name,
            description: db.description,
            units: db.units,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListCoursesQuery {
    /// Exact course code
    pub code: Option<String>,
}
