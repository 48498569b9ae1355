//! API request/response models for semesters.

use crate::db::models::semesters::{SemesterDBResponse, SemesterUpdateDBRequest};
use crate::types::SemesterId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SemesterCreate {
    #[schema(example = "First Semester")]
    pub name: Option<String>,
    #[schema(example = "2025-2026")]
    pub school_year: Option<String>,
    /// `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, strictly after `start_date`
    pub end_date: Option<String>,
    /// Defaults to true
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SemesterUpdate {
    pub name: Option<String>,
    pub school_year: Option<String>,
    pub is_active: Option<bool>,
}

impl From<SemesterUpdate> for SemesterUpdateDBRequest {
    fn from(update: SemesterUpdate) -> Self {
        Self {
            name: update.name,
            school_year: update.school_year,
            is_active: update.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SemesterResponse {
    pub id: SemesterId,
    pub name: String,
    pub school_year: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SemesterDBResponse> for SemesterResponse {
    fn from(db: SemesterDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            school_year: db.school_year,
            start_date: db.start_date,
            end_date: db.end_date,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListSemestersQuery {
    /// Only semesters currently accepting bookings
    #[serde(default)]
    pub active_only: bool,
}
