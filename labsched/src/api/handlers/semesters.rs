use crate::api::handlers::not_found_as;
use crate::api::json::JsonBody;
use crate::api::models::semesters::{ListSemestersQuery, SemesterCreate, SemesterResponse, SemesterUpdate};
use crate::api::models::users::CurrentUser;
use crate::auth::permissions::{RequiresPermission, permission};
use crate::db::handlers::{Repository, SemesterFilter};
use crate::db::models::semesters::{SemesterCreateDBRequest, SemesterUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::validation::{RequiredFields, not_blank, parse_date, present};
use crate::{AppState, types::SemesterId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

fn validate_create(request: SemesterCreate) -> Result<SemesterCreateDBRequest> {
    let mut required = RequiredFields::new();
    let name = required.take("name", request.name);
    let school_year = required.take("school_year", request.school_year);
    let start_date = required.take("start_date", request.start_date);
    let end_date = required.take("end_date", request.end_date);
    required.finish()?;

    let start_date = parse_date("start_date", &present(start_date, "start_date")?)?;
    let end_date = parse_date("end_date", &present(end_date, "end_date")?)?;
    if start_date >= end_date {
        return Err(Error::Range {
            message: format!("Semester start_date {start_date} must be before end_date {end_date}"),
        });
    }

    Ok(SemesterCreateDBRequest {
        name: present(name, "name")?.trim().to_string(),
        school_year: present(school_year, "school_year")?.trim().to_string(),
        start_date,
        end_date,
        is_active: request.is_active.unwrap_or(true),
    })
}

#[utoipa::path(
    get,
    path = "/semesters",
    tag = "semesters",
    summary = "List semesters",
    params(ListSemestersQuery),
    responses(
        (status = 200, description = "Semesters, latest start date first", body = Vec<SemesterResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_semesters(
    State(state): State<AppState>,
    _: CurrentUser,
    Query(query): Query<ListSemestersQuery>,
) -> Result<Json<Vec<SemesterResponse>>> {
    let mut store = state.db.begin().await?;
    let semesters = store
        .semesters()
        .list(&SemesterFilter {
            active_only: query.active_only,
        })
        .await?;
    Ok(Json(semesters.into_iter().map(SemesterResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/semesters",
    tag = "semesters",
    summary = "Create semester",
    request_body = SemesterCreate,
    responses(
        (status = 201, description = "Semester created", body = SemesterResponse),
        (status = 400, description = "Missing fields, malformed dates, or start_date not before end_date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_semester(
    State(state): State<AppState>,
    _: RequiresPermission<permission::FullSchedulingControl>,
    JsonBody(request): JsonBody<SemesterCreate>,
) -> Result<(StatusCode, Json<SemesterResponse>)> {
    let db_request = validate_create(request)?;

    let mut store = state.db.begin().await?;
    let created = store.semesters().create(&db_request).await?;
    store.commit().await?;

    tracing::info!(semester_id = created.id, "Created semester {} {}", created.name, created.school_year);
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/semesters/{id}",
    tag = "semesters",
    summary = "Get semester",
    params(("id" = SemesterId, Path, description = "Semester ID")),
    responses(
        (status = 200, description = "Semester", body = SemesterResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Semester not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(semester_id = id))]
pub async fn get_semester(State(state): State<AppState>, _: CurrentUser, Path(id): Path<SemesterId>) -> Result<Json<SemesterResponse>> {
    let mut store = state.db.begin().await?;
    let semester = store
        .semesters()
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Semester", id))?;
    Ok(Json(semester.into()))
}

#[utoipa::path(
    patch,
    path = "/semesters/{id}",
    tag = "semesters",
    summary = "Update semester",
    description = "Rename a semester or open/close it for new bookings. Dates are fixed once created.",
    params(("id" = SemesterId, Path, description = "Semester ID")),
    request_body = SemesterUpdate,
    responses(
        (status = 200, description = "Semester updated", body = SemesterResponse),
        (status = 400, description = "Blank name or school_year"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 404, description = "Semester not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(semester_id = id))]
pub async fn update_semester(
    State(state): State<AppState>,
    _: RequiresPermission<permission::FullSchedulingControl>,
    Path(id): Path<SemesterId>,
    JsonBody(update): JsonBody<SemesterUpdate>,
) -> Result<Json<SemesterResponse>> {
    not_blank("name", update.name.as_deref())?;
    not_blank("school_year", update.school_year.as_deref())?;

    let mut store = state.db.begin().await?;
    let updated = store
        .semesters()
        .update(id, &SemesterUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as("Semester", id))?;
    store.commit().await?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/semesters/{id}",
    tag = "semesters",
    summary = "Delete semester",
    description = "Fails with 400 while any schedule still belongs to the semester.",
    params(("id" = SemesterId, Path, description = "Semester ID")),
    responses(
        (status = 204, description = "Semester deleted"),
        (status = 400, description = "Semester still has schedules"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 404, description = "Semester not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(semester_id = id))]
pub async fn delete_semester(
    State(state): State<AppState>,
    _: RequiresPermission<permission::FullSchedulingControl>,
    Path(id): Path<SemesterId>,
) -> Result<StatusCode> {
    let mut store = state.db.begin().await?;
    if !store.semesters().delete(id).await? {
        return Err(Error::not_found("Semester", id));
    }
    store.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
