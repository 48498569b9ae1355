use crate::api::models::schedules::ScheduleResponse;
use crate::db::errors::DbError;
use crate::db::models::schedules::ScheduleDBResponse;
use crate::scheduling::conflicts::ConflictDimension;
use crate::types::Permission;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Actor lacks the permission for the operation, or does not own the resource
    #[error("Insufficient permissions to access {resource}")]
    InsufficientPermissions { required: Option<Permission>, resource: String },

    /// Required fields missing, or a field value outside its domain
    #[error("{message}")]
    Validation { message: String, fields: Vec<String> },

    /// A time or date that does not parse
    #[error("{message}")]
    Format { message: String },

    /// An empty or inverted interval
    #[error("{message}")]
    Range { message: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// A booking that overlaps existing ones on `dimension`
    #[error("{} ({} conflicting)", dimension.message(), conflicting.len())]
    Conflict {
        dimension: ConflictDimension,
        conflicting: Vec<ScheduleDBResponse>,
    },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Error::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::Validation { .. } | Error::Format { .. } | Error::Range { .. } | Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } | DbError::ExclusionViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InsufficientPermissions { required, resource } => match required {
                Some(permission) => format!("Insufficient permissions to access {resource} (requires {permission})"),
                None => format!("Insufficient permissions to access {resource}"),
            },
            Error::Validation { message, .. } | Error::Format { message } | Error::Range { message } | Error::BadRequest { message } => {
                message.clone()
            }
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::Conflict { dimension, .. } => dimension.message().to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => unique_violation_details(table.as_deref(), constraint.as_deref()).0,
                DbError::ExclusionViolation { constraint, .. } => constraint
                    .as_deref()
                    .and_then(ConflictDimension::from_constraint)
                    .map(|dimension| dimension.message().to_string())
                    .unwrap_or_else(|| "Schedule conflict detected".to_string()),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

/// Friendly message and resource name for a unique constraint
fn unique_violation_details(table: Option<&str>, constraint: Option<&str>) -> (String, &'static str) {
    match (table, constraint) {
        (Some("users"), Some(c)) if c.contains("email") => ("An account with this email address already exists".to_string(), "user"),
        (Some("courses"), Some(c)) if c.contains("code") => ("A course with this code already exists".to_string(), "course"),
        (Some("lab_rooms"), Some(c)) if c.contains("name") => ("A lab room with this name already exists".to_string(), "lab_room"),
        _ => ("Resource already exists".to_string(), "unknown"),
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::Validation { .. } | Error::Format { .. } | Error::Range { .. } | Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
        }

        let status = self.status_code();

        match self {
            Error::Conflict { dimension, conflicting } => {
                let conflicting: Vec<ScheduleResponse> = conflicting.into_iter().map(ScheduleResponse::from).collect();
                let body = json!({
                    "message": dimension.message(),
                    "dimension": dimension,
                    "conflicting_schedules": conflicting,
                });
                (status, Json(body)).into_response()
            }
            // The exclusion constraint fired after the in-transaction check passed
            Error::Database(DbError::ExclusionViolation { ref constraint, .. }) => {
                let dimension = constraint.as_deref().and_then(ConflictDimension::from_constraint);
                let message = dimension.map_or("Schedule conflict detected", ConflictDimension::message);
                let body = json!({
                    "message": message,
                    "dimension": dimension,
                    "conflicting_schedules": [],
                });
                (status, Json(body)).into_response()
            }
            Error::Database(DbError::UniqueViolation { ref constraint, ref table, .. }) => {
                let (message, resource) = unique_violation_details(table.as_deref(), constraint.as_deref());
                let body = json!({
                    "message": message,
                    "resource": resource
                });
                (status, Json(body)).into_response()
            }
            Error::Validation { ref message, ref fields } if !fields.is_empty() => {
                let body = json!({
                    "message": message,
                    "fields": fields,
                });
                (status, Json(body)).into_response()
            }
            other => {
                // For all other errors, return simple text message
                let user_message = other.user_message();
                (status, user_message).into_response()
            }
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::Range {
                message: "bad".to_string()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::not_found("Schedule", 7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::Conflict {
                dimension: ConflictDimension::Section,
                conflicting: vec![],
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Database(DbError::ExclusionViolation {
                constraint: Some("schedules_room_no_overlap".to_string()),
                table: Some("schedules".to_string()),
                message: String::new(),
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Database(DbError::ForeignKeyViolation {
                constraint: None,
                table: None,
                message: String::new(),
            })
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_conflict_body_names_dimension() {
        let response = Error::Conflict {
            dimension: ConflictDimension::Instructor,
            conflicting: vec![],
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Instructor schedule conflict detected");
        assert_eq!(body["dimension"], "instructor");
        assert_eq!(body["conflicting_schedules"], json!([]));
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let response = Error::Validation {
            message: "Missing required field(s): start_time".to_string(),
            fields: vec!["start_time".to_string()],
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["fields"], json!(["start_time"]));
    }

    #[tokio::test]
    async fn test_duplicate_email_message() {
        let response = Error::Database(DbError::UniqueViolation {
            constraint: Some("users_email_key".to_string()),
            table: Some("users".to_string()),
            message: String::new(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["resource"], "user");
    }
}
