use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::{validate_url, CreateResource, Resource, UpdateResource};
use crate::state::AppState;

async fn resource_for_member(state: &AppState, resource_id: Uuid, user_id: Uuid) -> Result<Resource> {
    let resource = state.resources.get_by_id(resource_id).await?;
    state.projects.require_role(resource.project_id, user_id).await?;
    Ok(resource)
}

pub async fn create_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateResource>,
) -> Result<(StatusCode, Json<Resource>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Resource name is required".to_string()));
    }
    validate_url(&input.url).map_err(AppError::Validation)?;

    state.projects.require_role(project_id, auth.user.id).await?;

    let resource = state.resources.create(project_id, &input).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn list_resources(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Resource>>> {
    state.projects.require_role(project_id, auth.user.id).await?;

    let resources = state.resources.list_by_project(project_id).await?;
    Ok(Json(resources))
}

pub async fn update_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(resource_id): Path<Uuid>,
    Json(input): Json<UpdateResource>,
) -> Result<Json<Resource>> {
    if matches!(&input.name, Some(name) if name.trim().is_empty()) {
        return Err(AppError::Validation("Resource name cannot be empty".to_string()));
    }
    if let Some(url) = &input.url {
        validate_url(url).map_err(AppError::Validation)?;
    }

    resource_for_member(&state, resource_id, auth.user.id).await?;

    let resource = state.resources.update(resource_id, &input).await?;
    Ok(Json(resource))
}

pub async fn delete_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(resource_id): Path<Uuid>,
) -> Result<()> {
    resource_for_member(&state, resource_id, auth.user.id).await?;
    state.resources.delete(resource_id).await?;
    Ok(())
}
