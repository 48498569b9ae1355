//! Store models for courses.

use crate::types::CourseId;

#[derive(Debug, Clone)]
pub struct CourseCreateDBRequest {
    pub code: String,
    pub name: String,
    pub description: String,
    pub units: i32,
}

#[derive(Debug, Clone, Default)]
pub struct CourseUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub units: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseDBResponse {
    pub id: CourseId,
    pub code: String,
    pub name: String,
    pub description: String,
    pub units: i32,
}
