//! API request/response models for sections.

use crate::db::models::sections::{SectionDBResponse, SectionUpdateDBRequest};
use crate::types::SectionId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SectionCreate {
    #[schema(example = "1A")]
    pub name: Option<String>,
    #[schema(example = "BSIT")]
    pub program: Option<String>,
    pub year_level: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SectionUpdate {
    pub name: Option<String>,
    pub program: Option<String>,
    pub year_level: Option<i32>,
}

impl From<SectionUpdate> for SectionUpdateDBRequest {
    fn from(update: SectionUpdate) -> Self {
        Self {
            name: update.name,
            program: update.program,
            year_level: update.year_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SectionResponse {
    pub id: SectionId,
    pub name: String,
    pub program: String,
    pub year_level: i32,
    /// `{program}-{name}`, e.g. `BSIT-1A`
    pub display_name: String,
}

impl From<SectionDBResponse> for SectionResponse {
    fn from(db: SectionDBResponse) -> Self {
        let display_name = db.display_name();
        Self {
            id: db.id,
            name: db.name,
            program: db.program,
            year_level: db.year_level,
            display_name,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListSectionsQuery {
    pub program: Option<String>,
    pub name: Option<String>,
}
