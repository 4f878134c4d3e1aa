use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Project, ProjectMember, ProjectRole};

#[derive(Clone)]
pub struct ProjectRepository {
    pool: Arc<SqlitePool>,
}

impl ProjectRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Create a project led by `leader_id`, who also becomes its first member
    pub async fn create(&self, name: &str, description: &str, leader_id: Uuid) -> Result<Project> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, name, description, leader_id, archived, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, datetime('now'), datetime('now'))
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(leader_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, created_at) VALUES ($1, $2, datetime('now'))",
        )
        .bind(project.id)
        .bind(leader_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(project)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(project)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Project> {
        self.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// Projects the user belongs to, most recently updated first
    pub async fn list_for_user(&self, user_id: Uuid, archived: bool) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.*
            FROM projects p
            INNER JOIN project_members pm ON p.id = pm.project_id
            WHERE pm.user_id = $1 AND p.archived = $2
            ORDER BY p.updated_at DESC
            "#,
        )
        .bind(user_id)
        .bind(archived)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(projects)
    }

    pub async fn set_archived(&self, id: Uuid, archived: bool) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET archived = $2, updated_at = datetime('now')
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(archived)
        .fetch_optional(self.pool.as_ref())
        .await?;

        project.ok_or(AppError::NotFound)
    }

    /// Delete a project; tasks, posts and their comments cascade
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    pub async fn get_user_role(&self, project_id: Uuid, user_id: Uuid) -> Result<Option<ProjectRole>> {
        let project = self.get_by_id(project_id).await?;
        if project.leader_id == user_id {
            return Ok(Some(ProjectRole::Leader));
        }

        let is_member = self.is_member(project_id, user_id).await?;
        Ok(is_member.then_some(ProjectRole::Member))
    }

    /// Role of `user_id`, or Forbidden when they are not in the project
    pub async fn require_role(&self, project_id: Uuid, user_id: Uuid) -> Result<ProjectRole> {
        self.get_user_role(project_id, user_id)
            .await?
            .ok_or(AppError::Forbidden)
    }

    pub async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    pub async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count > 0)
    }

    pub async fn list_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>> {
        let members = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT u.id AS user_id, u.name, u.email
            FROM project_members pm
            INNER JOIN users u ON pm.user_id = u.id
            WHERE pm.project_id = $1
            ORDER BY pm.created_at ASC, u.name ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(members)
    }
}
