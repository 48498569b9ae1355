//! Store models for semesters.

use crate::types::SemesterId;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone)]
pub struct SemesterCreateDBRequest {
    pub name: String,
    pub school_year: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SemesterUpdateDBRequest {
    pub name: Option<String>,
    pub school_year: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemesterDBResponse {
    pub id: SemesterId,
    pub name: String,
    pub school_year: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
