use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::comments::{Actor, CommentTree, Threaded};
use crate::error::{AppError, Result};
use crate::handlers::{posts::post_for_member, tasks::task_for_member};
use crate::models::{
    CommentResponse, CommentThreadResponse, CreateComment, DeleteCommentResponse, ProjectRole,
};
use crate::state::AppState;

/// Actor for a delete: the project's leader is flagged so the policy can honor it.
async fn delete_actor(state: &AppState, auth: &AuthUser, project_id: Uuid) -> Result<Actor> {
    let role = state.projects.get_user_role(project_id, auth.user.id).await?;
    Ok(auth
        .actor()
        .leading(role.as_ref().is_some_and(ProjectRole::is_leader)))
}

// ---------------------------------------------------------------------------
// Task comments (flat)
// ---------------------------------------------------------------------------

pub async fn list_task_comments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<CommentResponse>>> {
    task_for_member(&state, task_id, auth.user.id).await?;

    let comments = state.task_comments.list(task_id).await?;
    Ok(Json(comments.into_iter().map(|c| c.into()).collect()))
}

pub async fn create_task_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
    Json(input): Json<CreateComment>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    task_for_member(&state, task_id, auth.user.id).await?;

    let comment = state
        .task_comments
        .create(&auth.actor(), task_id, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(comment.into_response(auth.user.name)),
    ))
}

pub async fn delete_task_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DeleteCommentResponse>> {
    let task = state.tasks.get_by_id(task_id).await?;

    let comment = state.task_comments.get(comment_id).await?;
    if comment.container_id != task_id {
        return Err(AppError::NotFound);
    }

    let actor = delete_actor(&state, &auth, task.project_id).await?;
    let deleted = state.task_comments.delete(&actor, comment_id).await?;

    Ok(Json(DeleteCommentResponse { deleted }))
}

// ---------------------------------------------------------------------------
// Post comments (threaded)
// ---------------------------------------------------------------------------

pub async fn list_post_comments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<CommentResponse>>> {
    post_for_member(&state, post_id, auth.user.id).await?;

    let comments = state.post_comments.list(post_id).await?;
    Ok(Json(comments.into_iter().map(|c| c.into()).collect()))
}

/// Comments of a post nested under their parents.
pub async fn post_comment_thread(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<CommentThreadResponse>> {
    post_for_member(&state, post_id, auth.user.id).await?;

    let comments = state.post_comments.list(post_id).await?;
    let tree = CommentTree::build(&comments);

    let orphan_ids: Vec<Uuid> = tree.orphans().iter().map(|c| c.id()).collect();
    if !orphan_ids.is_empty() {
        tracing::warn!(
            post_id = %post_id,
            orphans = orphan_ids.len(),
            "post has comments whose parent is missing"
        );
    }

    Ok(Json(CommentThreadResponse {
        comments: tree.nested(|c| CommentResponse::from(c.clone())),
        orphan_ids,
    }))
}

pub async fn create_post_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<Uuid>,
    Json(input): Json<CreateComment>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    post_for_member(&state, post_id, auth.user.id).await?;

    let comment = state
        .post_comments
        .create(&auth.actor(), post_id, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(comment.into_response(auth.user.name)),
    ))
}

/// Delete a post comment together with all of its replies.
pub async fn delete_post_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<DeleteCommentResponse>> {
    let comment = state.post_comments.get(comment_id).await?;
    let post = state.posts.get_by_id(comment.container_id).await?;

    let actor = delete_actor(&state, &auth, post.project_id).await?;
    let deleted = state.post_comments.delete(&actor, comment_id).await?;

    Ok(Json(DeleteCommentResponse { deleted }))
}
