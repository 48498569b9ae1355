use crate::api::handlers::not_found_as;
use crate::api::json::JsonBody;
use crate::api::models::sections::{ListSectionsQuery, SectionCreate, SectionResponse, SectionUpdate};
use crate::api::models::users::CurrentUser;
use crate::auth::permissions::{RequiresPermission, permission};
use crate::db::handlers::{Repository, SectionFilter};
use crate::db::models::sections::{SectionCreateDBRequest, SectionUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::validation::{RequiredFields, at_least, not_blank, present};
use crate::{AppState, types::SectionId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[utoipa::path(
    get,
    path = "/sections",
    tag = "sections",
    summary = "List sections",
    description = "Sections ordered by program, year level and name. With both `program` and `name`, the one matching section, or 404.",
    params(ListSectionsQuery),
    responses(
        (status = 200, description = "Sections", body = Vec<SectionResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No section has the given program and name"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_sections(
    State(state): State<AppState>,
    _: CurrentUser,
    Query(query): Query<ListSectionsQuery>,
) -> Result<Json<Vec<SectionResponse>>> {
    let filter = SectionFilter {
        program: trimmed(query.program),
        name: trimmed(query.name),
    };

    let mut store = state.db.begin().await?;
    let sections = store.sections().list(&filter).await?;

    match (filter.program, filter.name) {
        (Some(program), Some(name)) if sections.is_empty() => Err(Error::NotFound {
            resource: "Section".to_string(),
            id: format!("{program}-{name}"),
        }),
        _ => Ok(Json(sections.into_iter().map(SectionResponse::from).collect())),
    }
}

#[utoipa::path(
    post,
    path = "/sections",
    tag = "sections",
    summary = "Create section",
    request_body = SectionCreate,
    responses(
        (status = 201, description = "Section created", body = SectionResponse),
        (status = 400, description = "Missing fields or year_level below 1"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_section(
    State(state): State<AppState>,
    _: RequiresPermission<permission::FullSchedulingControl>,
    JsonBody(request): JsonBody<SectionCreate>,
) -> Result<(StatusCode, Json<SectionResponse>)> {
    let mut required = RequiredFields::new();
    let name = required.take("name", request.name);
    let program = required.take("program", request.program);
    let year_level = required.take("year_level", request.year_level);
    required.finish()?;

    let year_level = present(year_level, "year_level")?;
    at_least("year_level", year_level, 1)?;

    let db_request = SectionCreateDBRequest {
        name: present(name, "name")?.trim().to_string(),
        program: present(program, "program")?.trim().to_string(),
        year_level,
    };

    let mut store = state.db.begin().await?;
    let created = store.sections().create(&db_request).await?;
    store.commit().await?;

    tracing::info!(section_id = created.id, "Created section {}", created.display_name());
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/sections/{id}",
    tag = "sections",
    summary = "Get section",
    params(("id" = SectionId, Path, description = "Section ID")),
    responses(
        (status = 200, description = "Section", body = SectionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Section not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(section_id = id))]
pub async fn get_section(State(state): State<AppState>, _: CurrentUser, Path(id): Path<SectionId>) -> Result<Json<SectionResponse>> {
    let mut store = state.db.begin().await?;
    let section = store
        .sections()
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Section", id))?;
    Ok(Json(section.into()))
}

#[utoipa::path(
    patch,
    path = "/sections/{id}",
    tag = "sections",
    summary = "Update section",
    params(("id" = SectionId, Path, description = "Section ID")),
    request_body = SectionUpdate,
    responses(
        (status = 200, description = "Section updated", body = SectionResponse),
        (status = 400, description = "Blank name or program, or year_level below 1"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 404, description = "Section not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(section_id = id))]
pub async fn update_section(
    State(state): State<AppState>,
    _: RequiresPermission<permission::FullSchedulingControl>,
    Path(id): Path<SectionId>,
    JsonBody(update): JsonBody<SectionUpdate>,
) -> Result<Json<SectionResponse>> {
    not_blank("name", update.name.as_deref())?;
    not_blank("program", update.program.as_deref())?;
    if let Some(year_level) = update.year_level {
        at_least("year_level", year_level, 1)?;
    }

    let mut store = state.db.begin().await?;
    let updated = store
        .sections()
        .update(id, &SectionUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as("Section", id))?;
    store.commit().await?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/sections/{id}",
    tag = "sections",
    summary = "Delete section",
    description = "Fails with 400 while any schedule still books the section.",
    params(("id" = SectionId, Path, description = "Section ID")),
    responses(
        (status = 204, description = "Section deleted"),
        (status = 400, description = "Section is still scheduled"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requires full_scheduling_control"),
        (status = 404, description = "Section not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("X-Labsched-User" = []))
)]
#[tracing::instrument(skip_all, fields(section_id = id))]
pub async fn delete_section(
    State(state): State<AppState>,
    _: RequiresPermission<permission::FullSchedulingControl>,
    Path(id): Path<SectionId>,
) -> Result<StatusCode> {
    let mut store = state.db.begin().await?;
    if !store.sections().delete(id).await? {
        return Err(Error::not_found("Section", id));
    }
    store.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
