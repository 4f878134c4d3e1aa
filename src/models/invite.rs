use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pending invitation; membership starts only when the invitee accepts.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invite {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub invited_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvite {
    pub user_id: Uuid,
}

/// An invite as the invitee sees it in their inbox
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InviteWithProject {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_name: String,
    pub invited_by: Uuid,
    pub inviter_name: String,
    pub created_at: DateTime<Utc>,
}

/// An invite as the project leader sees it
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InviteWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
