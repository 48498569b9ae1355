use crate::api::handlers::not_found_as;
use crate::api::json::JsonBody;
use crate::api::models::lab_rooms::{LabRoomCreate, LabRoomResponse, LabRoomUpdate, ListLabRoomsQuery};
use crate::api::models::users::CurrentUser;
use crate::auth::permissions::{RequiresPermission, permission};
use crate::db::handlers::{LabRoomFilter, Repository};
use crate::db::models::lab_rooms::{LabRoomCreateDBRequest, LabRoomUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::validation::{RequiredFields, at_least, present};
use crate::{AppState, types::LabRoomId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/lab-rooms",
    tag = "lab-rooms",
    summary = "List lab rooms",
    description = "Lab rooms ordered by name. With `name`, the one matching room, or 404.",
    params(ListLabRoomsQuery),
    responses(
        (status = 200, description = "Lab rooms", body = Vec<LabRoomResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No lab room has the given name"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_lab_rooms(
    State(state): State<AppState>,
    _: CurrentUser,
    Query(query): Query<ListLabRoomsQuery>,
) -> Result<Json<Vec<LabRoomResponse>>> {
    let filter = LabRoomFilter {
        name: query.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        active_only: query.active_only,
    };

    let mut store = state.db.begin().await?;
    let rooms = store.lab_rooms().list(&filter).await?;

    match filter.name {
        Some(name) if rooms.is_empty() => Err(Error::NotFound {
            resource: "Lab room".to_string(),
            id: name,
        }),
        _ => Ok(Json(rooms.into_iter().map(LabRoomResponse::from).collect())),
    }
}

#[utoipa::path(
    post,
    path = "/lab-rooms",
    tag = "lab-rooms",
    summary = "Create lab room",
    request_body = LabRoomCreate,
    responses(
        (status = 201, description = "Lab room created", body = LabRoomResponse),
        (status = 400, description = "Missing fields or capacity below 1"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 409, description = "A lab room with this name already exists"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_lab_room(
    State(state): State<AppState>,
    _: RequiresPermission<permission::FullSchedulingControl>,
    JsonBody(request): JsonBody<LabRoomCreate>,
) -> Result<(StatusCode, Json<LabRoomResponse>)> {
    let mut required = RequiredFields::new();
    let name = required.take("name", request.name);
    let capacity = required.take("capacity", request.capacity);
    required.finish()?;

    let capacity = present(capacity, "capacity")?;
    at_least("capacity", capacity, 1)?;

    let db_request = LabRoomCreateDBRequest {
        name: present(name, "name")?.trim().to_string(),
        capacity,
        description: request.description.unwrap_or_default(),
        is_active: request.is_active.unwrap_or(true),
    };

    let mut store = state.db.begin().await?;
    let created = store.lab_rooms().create(&db_request).await?;
    store.commit().await?;

    tracing::info!(lab_room_id = created.id, "Created lab room {}", created.name);
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/lab-rooms/{id}",
    tag = "lab-rooms",
    summary = "Get lab room",
    params(("id" = LabRoomId, Path, description = "Lab room ID")),
    responses(
        (status = 200, description = "Lab room", body = LabRoomResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Lab room not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(lab_room_id = id))]
pub async fn get_lab_room(State(state): State<AppState>, _: CurrentUser, Path(id): Path<LabRoomId>) -> Result<Json<LabRoomResponse>> {
    let mut store = state.db.begin().await?;
    let room = store
        .lab_rooms()
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Lab room", id))?;
    Ok(Json(room.into()))
}

#[utoipa::path(
    patch,
    path = "/lab-rooms/{id}",
    tag = "lab-rooms",
    summary = "Update lab room",
    description = "Deactivating a room keeps its existing bookings but stops new ones from using it.",
    params(("id" = LabRoomId, Path, description = "Lab room ID")),
    request_body = LabRoomUpdate,
    responses(
        (status = 200, description = "Lab room updated", body = LabRoomResponse),
        (status = 400, description = "Capacity below 1"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 404, description = "Lab room not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(lab_room_id = id))]
pub async fn update_lab_room(
    State(state): State<AppState>,
    _: RequiresPermission<permission::FullSchedulingControl>,
    Path(id): Path<LabRoomId>,
    JsonBody(update): JsonBody<LabRoomUpdate>,
) -> Result<Json<LabRoomResponse>> {
    if let Some(capacity) = update.capacity {
        at_least("capacity", capacity, 1)?;
    }

    let mut store = state.db.begin().await?;
    let updated = store
        .lab_rooms()
        .update(id, &LabRoomUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as("Lab room", id))?;
    store.commit().await?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/lab-rooms/{id}",
    tag = "lab-rooms",
    summary = "Delete lab room",
    description = "Fails with 400 while any schedule still books the room; deactivate it instead.",
    params(("id" = LabRoomId, Path, description = "Lab room ID")),
    responses(
        (status = 204, description = "Lab room deleted"),
        (status = 400, description = "Lab room is still scheduled"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 404, description = "Lab room not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(lab_room_id = id))]
pub async fn delete_lab_room(
    State(state): State<AppState>,
    _: RequiresPermission<permission::FullSchedulingControl>,
    Path(id): Path<LabRoomId>,
) -> Result<StatusCode> {
    let mut store = state.db.begin().await?;
    if !store.lab_rooms().delete(id).await? {
        return Err(Error::not_found("Lab room", id));
    }
    store.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
