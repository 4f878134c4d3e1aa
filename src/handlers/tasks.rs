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
    validate_date_range, validate_todos, CreateTask, Task, TaskResponse, TaskStatus, UpdateTask,
};
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
}

/// Load a task and check the user belongs to its project
pub(crate) async fn task_for_member(state: &AppState, task_id: Uuid, user_id: Uuid) -> Result<Task> {
    let task = state.tasks.get_by_id(task_id).await?;
    state.projects.require_role(task.project_id, user_id).await?;
    Ok(task)
}

/// Only project members can be assigned
async fn check_assignees(state: &AppState, project_id: Uuid, assignee_ids: &[Uuid]) -> Result<()> {
    for user_id in assignee_ids {
        if !state.projects.is_member(project_id, *user_id).await? {
            return Err(AppError::Validation(format!(
                "User {} is not a member of this project",
                user_id
            )));
        }
    }
    Ok(())
}

async fn with_assignees(state: &AppState, tasks: Vec<Task>) -> Result<Vec<TaskResponse>> {
    let mut assignees = state.tasks.assignees_for(&tasks).await?;
    Ok(tasks
        .into_iter()
        .map(|task| TaskResponse {
            assignees: assignees.remove(&task.id).unwrap_or_default(),
            task,
        })
        .collect())
}

async fn one_with_assignees(state: &AppState, task: Task) -> Result<TaskResponse> {
    let mut responses = with_assignees(state, vec![task]).await?;
    responses.pop().ok_or(AppError::NotFound)
}

pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<TaskResponse>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Task name is required".to_string()));
    }
    validate_date_range(input.start_date, input.end_date).map_err(AppError::Validation)?;
    validate_todos(&input.todos).map_err(AppError::Validation)?;

    state.projects.require_role(project_id, auth.user.id).await?;
    check_assignees(&state, project_id, &input.assignee_ids).await?;

    let task = state.tasks.create(project_id, auth.user.id, &input).await?;
    let response = one_with_assignees(&state, task).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<TaskResponse>>> {
    state.projects.require_role(project_id, auth.user.id).await?;

    let tasks = state.tasks.list_by_project(project_id, filter.status).await?;
    Ok(Json(with_assignees(&state, tasks).await?))
}

/// Everything assigned to the caller outside archived projects
pub async fn list_my_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<TaskResponse>>> {
    let tasks = state.tasks.list_assigned_to(auth.user.id).await?;
    Ok(Json(with_assignees(&state, tasks).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskResponse>> {
    let task = task_for_member(&state, task_id, auth.user.id).await?;
    Ok(Json(one_with_assignees(&state, task).await?))
}

/// Partial update; moving a card on the kanban board sends only `status`.
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<TaskResponse>> {
    if matches!(&input.name, Some(name) if name.trim().is_empty()) {
        return Err(AppError::Validation("Task name cannot be empty".to_string()));
    }
    if let Some(todos) = &input.todos {
        validate_todos(todos).map_err(AppError::Validation)?;
    }

    let task = task_for_member(&state, task_id, auth.user.id).await?;
    validate_date_range(
        input.start_date.or(task.start_date),
        input.end_date.or(task.end_date),
    )
    .map_err(AppError::Validation)?;
    if let Some(assignee_ids) = &input.assignee_ids {
        check_assignees(&state, task.project_id, assignee_ids).await?;
    }

    let updated = state.tasks.update(task_id, &input).await?;

    if updated.status != task.status {
        tracing::debug!(task_id = %task_id, from = %task.status, to = %updated.status, "task moved");
    }

    Ok(Json(one_with_assignees(&state, updated).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<()> {
    task_for_member(&state, task_id, auth.user.id).await?;
    state.tasks.delete(task_id).await?;
    Ok(())
}
