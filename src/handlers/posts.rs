use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::{CreatePost, Post, PostSummary};
use crate::state::AppState;

/// Load a post and check the user belongs to its project
pub(crate) async fn post_for_member(state: &AppState, post_id: Uuid, user_id: Uuid) -> Result<Post> {
    let post = state.posts.get_by_id(post_id).await?;
    state.projects.require_role(post.project_id, user_id).await?;
    Ok(post)
}

pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreatePost>,
) -> Result<(StatusCode, Json<Post>)> {
    if input.title.trim().is_empty() {
        return Err(AppError::Validation("Post title is required".to_string()));
    }
    if input.content.trim().is_empty() {
        return Err(AppError::Validation("Post content is required".to_string()));
    }

    state.projects.require_role(project_id, auth.user.id).await?;

    let post = state
        .posts
        .create(project_id, auth.user.id, &input.title, &input.content)
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn list_posts(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<PostSummary>>> {
    state.projects.require_role(project_id, auth.user.id).await?;

    let posts = state.posts.list_by_project(project_id).await?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Post>> {
    let post = post_for_member(&state, post_id, auth.user.id).await?;
    Ok(Json(post))
}

/// Only the author or the project leader may delete a post.
pub async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<()> {
    let post = state.posts.get_by_id(post_id).await?;
    let role = state.projects.require_role(post.project_id, auth.user.id).await?;

    if post.author_id != auth.user.id && !role.is_leader() {
        return Err(AppError::Forbidden);
    }

    state.posts.delete(post_id).await?;
    Ok(())
}
