use crate::api::json::JsonBody;
use crate::api::models::schedules::{ListSchedulesQuery, ScheduleCreate, ScheduleResponse, ScheduleUpdate};
use crate::api::models::users::CurrentUser;
use crate::errors::Result;
use crate::scheduling::service;
use crate::{AppState, types::ScheduleId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/schedules",
    tag = "schedules",
    summary = "List schedules",
    description = "Bookings matching every given filter, ordered by day of week, start time and id.",
    params(ListSchedulesQuery),
    responses(
        (status = 200, description = "Matching schedules", body = Vec<ScheduleResponse>),
        (status = 400, description = "Unparsable filter value"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn list_schedules(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListSchedulesQuery>,
) -> Result<Json<Vec<ScheduleResponse>>> {
    let store = state.db.begin().await?;
    let schedules = service::list_schedules(store, &query).await?;
    Ok(Json(schedules.into_iter().map(ScheduleResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/schedules",
    tag = "schedules",
    summary = "Create schedule",
    description = "Book a weekly slot. Rejected with 409 when it overlaps an existing booking of the same room, section or instructor on the same semester and day. The instructor is notified.",
    request_body = ScheduleCreate,
    responses(
        (status = 201, description = "Schedule created", body = ScheduleResponse),
        (status = 400, description = "Missing or malformed fields, or an inverted time range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 404, description = "A referenced record does not exist"),
        (status = 409, description = "Overlaps an existing booking"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn create_schedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(request): JsonBody<ScheduleCreate>,
) -> Result<(StatusCode, Json<ScheduleResponse>)> {
    let store = state.db.begin().await?;
    let created = service::create_schedule(store, state.notifier.as_ref(), &current_user.actor(), request).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/schedules/{id}",
    tag = "schedules",
    summary = "Get schedule",
    params(("id" = ScheduleId, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule", body = ScheduleResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Schedule not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id, schedule_id = id))]
pub async fn get_schedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ScheduleId>,
) -> Result<Json<ScheduleResponse>> {
    let store = state.db.begin().await?;
    let schedule = service::get_schedule(store, id).await?;
    Ok(Json(schedule.into()))
}

#[utoipa::path(
    patch,
    path = "/schedules/{id}",
    tag = "schedules",
    summary = "Update schedule",
    description = "Change any fields of a booking. The resulting record is checked for overlaps as a whole, ignoring itself. A new instructor is notified.",
    params(("id" = ScheduleId, Path, description = "Schedule ID")),
    request_body = ScheduleUpdate,
    responses(
        (status = 200, description = "Schedule updated", body = ScheduleResponse),
        (status = 400, description = "Malformed fields, or an inverted time range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 404, description = "Schedule or a referenced record not found"),
        (status = 409, description = "Overlaps an existing booking"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id, schedule_id = id))]
pub async fn update_schedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ScheduleId>,
    JsonBody(request): JsonBody<ScheduleUpdate>,
) -> Result<Json<ScheduleResponse>> {
    let store = state.db.begin().await?;
    let updated = service::update_schedule(store, state.notifier.as_ref(), &current_user.actor(), id, request).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/schedules/{id}",
    tag = "schedules",
    summary = "Delete schedule",
    description = "Remove a booking. Its instructor is told it was cancelled.",
    params(("id" = ScheduleId, Path, description = "Schedule ID")),
    responses(
        (status = 204, description = "Schedule deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 404, description = "Schedule not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id, schedule_id = id))]
pub async fn delete_schedule(State(state): State<AppState>, current_user: CurrentUser, Path(id): Path<ScheduleId>) -> Result<StatusCode> {
    let store = state.db.begin().await?;
    service::delete_schedule(store, state.notifier.as_ref(), &current_user.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
