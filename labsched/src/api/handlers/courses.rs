use crate::api::handlers::not_found_as;
use crate::api::json::JsonBody;
use crate::api::models::courses::{CourseCreate, CourseResponse, CourseUpdate, ListCoursesQuery};
use crate::api::models::users::CurrentUser;
use crate::auth::permissions::{RequiresPermission, permission};
use crate::db::handlers::{CourseFilter, Repository};
use crate::db::models::courses::{CourseCreateDBRequest, CourseUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::validation::{RequiredFields, at_least, not_blank, present};
use crate::{AppState, types::CourseId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/courses",
    tag = "courses",
    summary = "List courses",
    description = "All courses ordered by code. With `code`, the one matching course, or 404.",
    params(ListCoursesQuery),
    responses(
        (status = 200, description = "Courses", body = Vec<CourseResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No course has the given code"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_courses(
    State(state): State<AppState>,
    _: CurrentUser,
    Query(query): Query<ListCoursesQuery>,
) -> Result<Json<Vec<CourseResponse>>> {
    let code = query.code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

    let mut store = state.db.begin().await?;
    let courses = store.courses().list(&CourseFilter { code: code.clone() }).await?;

    match code {
        Some(code) if courses.is_empty() => Err(Error::NotFound {
            resource: "Course".to_string(),
            id: code,
        }),
        _ => Ok(Json(courses.into_iter().map(CourseResponse::from).collect())),
    }
}

#[utoipa::path(
    post,
    path = "/courses",
    tag = "courses",
    summary = "Create course",
    request_body = CourseCreate,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Missing fields or units below 1"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 409, description = "A course with this code already exists"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_course(
    State(state): State<AppState>,
    _: RequiresPermission<permission::FullSchedulingControl>,
    JsonBody(request): JsonBody<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>)> {
    let mut required = RequiredFields::new();
    let code = required.take("code", request.code);
    let name = required.take("name", request.name);
    let units = required.take("units", request.units);
    required.finish()?;

    let units = present(units, "units")?;
    at_least("units", units, 1)?;

    let db_request = CourseCreateDBRequest {
        code: present(code, "code")?.trim().to_string(),
        name: present(name, "name")?.trim().to_string(),
        description: request.description.unwrap_or_default(),
        units,
    };

    let mut store = state.db.begin().await?;
    let created = store.courses().create(&db_request).await?;
    store.commit().await?;

    tracing::info!(course_id = created.id, "Created course {}", created.code);
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/courses/{id}",
    tag = "courses",
    summary = "Get course",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course", body = CourseResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(course_id = id))]
pub async fn get_course(State(state): State<AppState>, _: CurrentUser, Path(id): Path<CourseId>) -> Result<Json<CourseResponse>> {
    let mut store = state.db.begin().await?;
    let course = store
        .courses()
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Course", id))?;
    Ok(Json(course.into()))
}

#[utoipa::path(
    patch,
    path = "/courses/{id}",
    tag = "courses",
    summary = "Update course",
    description = "The code is immutable; name, description and units can change.",
    params(("id" = CourseId, Path, description = "Course ID")),
    request_body = CourseUpdate,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Blank name or units below 1"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(course_id = id))]
pub async fn update_course(
    State(state): State<AppState>,
    _: RequiresPermission<permission::FullSchedulingControl>,
    Path(id): Path<CourseId>,
    JsonBody(update): JsonBody<CourseUpdate>,
) -> Result<Json<CourseResponse>> {
    not_blank("name", update.name.as_deref())?;
    if let Some(units) = update.units {
        at_least("units", units, 1)?;
    }

    let mut store = state.db.begin().await?;
    let updated = store
        .courses()
        .update(id, &CourseUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as("Course", id))?;
    store.commit().await?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/courses/{id}",
    tag = "courses",
    summary = "Delete course",
    description = "Fails with 400 while any schedule still books the course.",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 400, description = "Course is still scheduled"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(course_id = id))]
pub async fn delete_course(
    State(state): State<AppState>,
    _: RequiresPermission<permission::FullSchedulingControl>,
    Path(id): Path<CourseId>,
) -> Result<StatusCode> {
    let mut store = state.db.begin().await?;
    if !store.courses().delete(id).await? {
        return Err(Error::not_found("Course", id));
    }
    store.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
