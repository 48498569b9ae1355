//! Store models for users.

use crate::api::models::users::{Role, UserCreate, UserUpdate};
use crate::types::UserId;
use chrono::{DateTime, Utc};

/// Store request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub student_id: Option<String>,
    pub classification: Option<String>,
    pub roles: Vec<Role>,
}

impl From<UserCreate> for UserCreateDBRequest {
    fn from(api: UserCreate) -> Self {
        Self {
            email: api.email.trim().to_lowercase(),
            first_name: api.first_name,
            last_name: api.last_name,
            student_id: api.student_id,
            classification: api.classification,
            roles: api.roles,
        }
    }
}

/// Store request for updating a user
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub classification: Option<String>,
    pub is_active: Option<bool>,
    /// Replaces the full role list when present
    pub roles: Option<Vec<Role>>,
}

impl From<UserUpdate> for UserUpdateDBRequest {
    fn from(update: UserUpdate) -> Self {
        Self {
            first_name: update.first_name,
            last_name: update.last_name,
            classification: update.classification,
            is_active: update.is_active,
            roles: update.roles,
        }
    }
}

/// A stored user with their roles
#[derive(Debug, Clone, PartialEq)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub student_id: Option<String>,
    pub classification: Option<String>,
    pub is_active: bool,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDBResponse {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
