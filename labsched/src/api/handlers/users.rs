use crate::api::handlers::not_found_as;
use crate::api::json::JsonBody;
use crate::api::models::users::{CurrentUser, ListUsersQuery, UserCreate, UserResponse, UserUpdate};
use crate::auth::permissions::{RequiresPermission, permission};
use crate::db::handlers::{Repository, UserFilter};
use crate::db::models::users::{UserCreateDBRequest, UserUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::validation::not_blank;
use crate::{AppState, types::UserId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

fn validate_create(request: &UserCreate) -> Result<()> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::Validation {
            message: format!("'{}' is not a valid email address", request.email),
            fields: vec!["email".to_string()],
        });
    }
    not_blank("first_name", Some(&request.first_name))?;
    not_blank("last_name", Some(&request.last_name))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Users ordered by id", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires system_management"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _: RequiresPermission<permission::SystemManagement>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    let (skip, limit) = query.pagination.params();
    let mut store = state.db.begin().await?;
    let users = store.users().list(&UserFilter::new(skip, limit)).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid email or blank name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires system_management"),
        (status = 409, description = "Email already in use"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    _: RequiresPermission<permission::SystemManagement>,
    JsonBody(request): JsonBody<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    validate_create(&request)?;

    let mut store = state.db.begin().await?;
    let created = store.users().create(&UserCreateDBRequest::from(request)).await?;
    store.commit().await?;

    tracing::info!(user_id = created.id, roles = ?created.roles, "Created user");
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/users/current",
    tag = "users",
    summary = "Get current user",
    description = "The caller's identity with the permissions derived from their roles.",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "Unauthorized")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn get_current_user(current_user: CurrentUser) -> Json<CurrentUser> {
    Json(current_user)
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    params(("id" = UserId, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn get_user(State(state): State<AppState>, _: CurrentUser, Path(id): Path<UserId>) -> Result<Json<UserResponse>> {
    let mut store = state.db.begin().await?;
    let user = store.users().get_by_id(id).await?.ok_or_else(|| Error::not_found("User", id))?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user",
    description = "A `roles` list replaces every role the user holds.",
    params(("id" = UserId, Path, description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Blank name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires system_management"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn update_user(
    State(state): State<AppState>,
    _: RequiresPermission<permission::SystemManagement>,
    Path(id): Path<UserId>,
    JsonBody(update): JsonBody<UserUpdate>,
) -> Result<Json<UserResponse>> {
    not_blank("first_name", update.first_name.as_deref())?;
    not_blank("last_name", update.last_name.as_deref())?;

    let mut store = state.db.begin().await?;
    let updated = store
        .users()
        .update(id, &UserUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as("User", id))?;
    store.commit().await?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete user",
    description = "Users still referenced by schedules cannot be deleted; deactivate them instead.",
    params(("id" = UserId, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Own account, or user still referenced by schedules"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires system_management"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: RequiresPermission<permission::SystemManagement>,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    if admin.user.id == id {
        return Err(Error::BadRequest {
            message: "Cannot delete your own account".to_string(),
        });
    }

    let mut store = state.db.begin().await?;
    if !store.users().delete(id).await? {
        return Err(Error::not_found("User", id));
    }
    store.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::{Role, UserResponse};
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[test_log::test(tokio::test)]
    async fn test_user_management_requires_system_management() {
        let (server, state) = test_app().await;
        let coordinator = create_test_user(&state, Role::AcademicCoordinator).await;
        let (header, value) = add_auth_headers(coordinator.id);

        let response = server.get("/api/v1/users").add_header(header.clone(), value.clone()).await;
        response.assert_status(StatusCode::FORBIDDEN);

        // Looking up a single user is open to anyone signed in
        let response = server
            .get(&format!("/api/v1/users/{}", coordinator.id))
            .add_header(header, value)
            .await;
        response.assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_create_and_update_user() {
        let (server, state) = test_app().await;
        let admin = create_test_user(&state, Role::SystemAdministrator).await;
        let (header, value) = add_auth_headers(admin.id);

        let response = server
            .post("/api/v1/users")
            .add_header(header.clone(), value.clone())
            .json(&json!({
                "email": "  M.Reyes@Example.EDU ",
                "first_name": "Maria",
                "last_name": "Reyes",
                "classification": "Full-time",
                "roles": ["faculty_staff"],
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: UserResponse = response.json();
        assert_eq!(created.email, "m.reyes@example.edu");
        assert_eq!(created.full_name, "Maria Reyes");
        assert_eq!(created.roles, vec![Role::FacultyStaff]);

        let response = server
            .post("/api/v1/users")
            .add_header(header.clone(), value.clone())
            .json(&json!({ "email": "m.reyes@example.edu", "first_name": "M", "last_name": "R" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let response = server
            .patch(&format!("/api/v1/users/{}", created.id))
            .add_header(header.clone(), value.clone())
            .json(&json!({ "roles": ["faculty_staff", "dean"] }))
            .await;
        response.assert_status_ok();
        let updated: UserResponse = response.json();
        assert!(updated.roles.contains(&Role::Dean));

        let response = server
            .patch("/api/v1/users/999999")
            .add_header(header, value)
            .json(&json!({ "is_active": false }))
            .await;
        response.assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_invalid_email_is_rejected() {
        let (server, state) = test_app().await;
        let admin = create_test_user(&state, Role::SystemAdministrator).await;
        let (header, value) = add_auth_headers(admin.id);

        let response = server
            .post("/api/v1/users")
            .add_header(header, value)
            .json(&json!({ "email": "not-an-email", "first_name": "A", "last_name": "B" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["fields"], json!(["email"]));
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_user() {
        let (server, state) = test_app().await;
        let admin = create_test_user(&state, Role::SystemAdministrator).await;
        let student = create_test_user(&state, Role::Student).await;
        let (header, value) = add_auth_headers(admin.id);

        let response = server
            .delete(&format!("/api/v1/users/{}", admin.id))
            .add_header(header.clone(), value.clone())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .delete(&format!("/api/v1/users/{}", student.id))
            .add_header(header.clone(), value.clone())
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = server
            .delete(&format!("/api/v1/users/{}", student.id))
            .add_header(header, value)
            .await;
        response.assert_status_not_found();
    }
}
