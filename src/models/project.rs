use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Leader,
    Member,
}

impl std::fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectRole::Leader => write!(f, "leader"),
            ProjectRole::Member => write!(f, "member"),
        }
    }
}

impl ProjectRole {
    pub fn is_leader(&self) -> bool {
        matches!(self, ProjectRole::Leader)
    }

    pub fn can_invite(&self) -> bool {
        matches!(self, ProjectRole::Leader)
    }

    pub fn can_delete(&self) -> bool {
        matches!(self, ProjectRole::Leader)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub leader_id: Uuid,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetArchived {
    pub archived: bool,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub leader_id: Uuid,
    pub archived: bool,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProjectWithMembers {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub leader_id: Uuid,
    pub archived: bool,
    pub role: String,
    pub members: Vec<ProjectMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn into_response(self, role: ProjectRole) -> ProjectResponse {
        ProjectResponse {
            id: self.id,
            name: self.name,
            description: self.description,
            leader_id: self.leader_id,
            archived: self.archived,
            role: role.to_string(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
