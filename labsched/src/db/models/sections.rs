//! Store models for sections (a cohort of students, e.g. BSIT-1A).

use crate::types::SectionId;

#[derive(Debug, Clone)]
pub struct SectionCreateDBRequest {
    pub name: String,
    pub program: String,
    pub year_level: i32,
}

#[derive(Debug, Clone, Default)]
pub struct SectionUpdateDBRequest {
    pub name: Option<String>,
    pub program: Option<String>,
    pub year_level: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionDBResponse {
    pub id: SectionId,
    pub name: String,
    pub program: String,
    pub year_level: i32,
}

impl SectionDBResponse {
    /// Program-qualified name, e.g. `BSIT-1A`
    pub fn display_name(&self) -> String {
        format!("{}-{}", self.program, self.name)
    }
}
