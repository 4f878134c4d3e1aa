use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::{
    CreateInvite, Invite, InviteWithProject, InviteWithUser, ProjectResponse, ProjectRole,
};
use crate::state::AppState;

/// Leader invites a registered user into the project.
pub async fn create_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateInvite>,
) -> Result<(StatusCode, Json<Invite>)> {
    let role = state.projects.require_role(project_id, auth.user.id).await?;
    if !role.can_invite() {
        return Err(AppError::Forbidden);
    }

    state.users.get_by_id(input.user_id).await?;
    if state.projects.is_member(project_id, input.user_id).await? {
        return Err(AppError::BadRequest(
            "User is already a member of this project".to_string(),
        ));
    }

    let invite = state
        .invites
        .create(project_id, input.user_id, auth.user.id)
        .await?;

    tracing::info!(project_id = %project_id, invitee = %input.user_id, "invite sent");
    Ok((StatusCode::CREATED, Json(invite)))
}

pub async fn list_project_invites(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<InviteWithUser>>> {
    state.projects.require_role(project_id, auth.user.id).await?;

    let invites = state.invites.list_for_project(project_id).await?;
    Ok(Json(invites))
}

pub async fn list_my_invites(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<InviteWithProject>>> {
    let invites = state.invites.list_for_user(auth.user.id).await?;
    Ok(Json(invites))
}

/// Only the invitee can accept; they join as a member.
pub async fn accept_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invite_id): Path<Uuid>,
) -> Result<Json<ProjectResponse>> {
    let invite = state.invites.get_by_id(invite_id).await?;
    if invite.user_id != auth.user.id {
        return Err(AppError::Forbidden);
    }

    state.invites.accept(&invite).await?;
    let project = state.projects.get_by_id(invite.project_id).await?;

    tracing::info!(project_id = %project.id, user_id = %auth.user.id, "invite accepted");
    Ok(Json(project.into_response(ProjectRole::Member)))
}

/// The invitee declines or the leader withdraws.
pub async fn delete_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invite_id): Path<Uuid>,
) -> Result<()> {
    let invite = state.invites.get_by_id(invite_id).await?;

    if invite.user_id != auth.user.id {
        let project = state.projects.get_by_id(invite.project_id).await?;
        if project.leader_id != auth.user.id {
            return Err(AppError::Forbidden);
        }
    }

    state.invites.delete(invite_id).await?;
    Ok(())
}
