//! API request/response models for users.

use super::pagination::Pagination;
use crate::auth::permissions::permissions_for;
use crate::db::models::users::UserDBResponse;
use crate::types::{Actor, PermissionSet, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Job function of a user. Permissions derive from roles through a fixed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SystemAdministrator,
    AcademicCoordinator,
    Dean,
    FacultyStaff,
    Student,
}

// User request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub student_id: Option<String>,
    pub classification: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub classification: Option<String>,
    pub is_active: Option<bool>,
    /// Replaces the full role list
    pub roles: Option<Vec<Role>>,
}

// User response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub student_id: Option<String>,
    pub classification: Option<String>,
    pub is_active: bool,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListUsersQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// The authenticated caller, as resolved by the [`CurrentUser`] extractor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<Role>,
    pub permissions: PermissionSet,
}

impl CurrentUser {
    /// The identity handed to the scheduling core
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.permissions.clone())
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        let permissions = permissions_for(&db.roles);
        Self {
            id: db.id,
            full_name: db.full_name(),
            email: db.email,
            roles: db.roles,
            permissions,
        }
    }
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            full_name: db.full_name(),
            email: db.email,
            first_name: db.first_name,
            last_name: db.last_name,
            student_id: db.student_id,
            classification: db.classification,
            is_active: db.is_active,
            roles: db.roles,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
