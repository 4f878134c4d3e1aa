use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::UserResponse;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize, Default)]
pub struct UserSearch {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search_query: Option<String>,
    /// Comma-separated user ids, e.g. the current members when inviting
    pub exclude: Option<String>,
}

fn parse_exclude(raw: Option<&str>) -> Result<Vec<Uuid>> {
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<Uuid>()
                .map_err(|_| AppError::BadRequest(format!("Invalid user id in exclude: {}", id)))
        })
        .collect()
}

pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<UserSearch>,
) -> Result<Json<Vec<UserResponse>>> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = params.page.unwrap_or(1).max(1);
    let exclude = parse_exclude(params.exclude.as_deref())?;

    let users = state
        .users
        .search(
            params.search_query.as_deref(),
            &exclude,
            limit,
            (page - 1) * limit,
        )
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
