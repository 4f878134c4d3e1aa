use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::{
    CreateProject, ProjectResponse, ProjectRole, ProjectWithMembers, SetArchived,
};
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct ProjectFilter {
    #[serde(default)]
    pub archived: bool,
}

pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateProject>,
) -> Result<(StatusCode, Json<ProjectResponse>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Project name is required".to_string()));
    }

    let project = state
        .projects
        .create(
            &input.name,
            input.description.as_deref().unwrap_or(""),
            auth.user.id,
        )
        .await?;

    tracing::info!(project_id = %project.id, leader = %auth.user.id, "project created");

    Ok((
        StatusCode::CREATED,
        Json(project.into_response(ProjectRole::Leader)),
    ))
}

pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ProjectFilter>,
) -> Result<Json<Vec<ProjectResponse>>> {
    let projects = state
        .projects
        .list_for_user(auth.user.id, filter.archived)
        .await?;

    Ok(Json(
        projects
            .into_iter()
            .map(|project| {
                let role = if project.leader_id == auth.user.id {
                    ProjectRole::Leader
                } else {
                    ProjectRole::Member
                };
                project.into_response(role)
            })
            .collect(),
    ))
}

pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectWithMembers>> {
    let project = state.projects.get_by_id(project_id).await?;
    let role = state.projects.require_role(project_id, auth.user.id).await?;
    let members = state.projects.list_members(project_id).await?;

    Ok(Json(ProjectWithMembers {
        id: project.id,
        name: project.name,
        description: project.description,
        leader_id: project.leader_id,
        archived: project.archived,
        role: role.to_string(),
        members,
        created_at: project.created_at,
        updated_at: project.updated_at,
    }))
}

pub async fn set_archived(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<SetArchived>,
) -> Result<Json<ProjectResponse>> {
    let role = state.projects.require_role(project_id, auth.user.id).await?;
    if !role.is_leader() {
        return Err(AppError::Forbidden);
    }

    let project = state.projects.set_archived(project_id, input.archived).await?;
    Ok(Json(project.into_response(role)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<()> {
    let role = state.projects.require_role(project_id, auth.user.id).await?;
    if !role.can_delete() {
        return Err(AppError::Forbidden);
    }

    state.projects.delete(project_id).await?;
    tracing::info!(project_id = %project_id, "project deleted");
    Ok(())
}

/// The leader may remove anyone but themself; members may leave.
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<()> {
    let project = state.projects.get_by_id(project_id).await?;

    if project.leader_id != auth.user.id && user_id != auth.user.id {
        return Err(AppError::Forbidden);
    }

    if user_id == project.leader_id {
        return Err(AppError::BadRequest(
            "The project leader cannot be removed".to_string(),
        ));
    }

    state.projects.remove_member(project_id, user_id).await?;
    Ok(())
}
