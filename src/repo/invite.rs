use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Invite, InviteWithProject, InviteWithUser};

#[derive(Clone)]
pub struct InviteRepository {
    pool: Arc<SqlitePool>,
}

impl InviteRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, project_id: Uuid, user_id: Uuid, invited_by: Uuid) -> Result<Invite> {
        let id = Uuid::new_v4();

        let invite = sqlx::query_as::<_, Invite>(
            r#"
            INSERT INTO project_invites (id, project_id, user_id, invited_by, created_at)
            VALUES ($1, $2, $3, $4, datetime('now'))
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(project_id)
        .bind(user_id)
        .bind(invited_by)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::BadRequest("User is already invited to this project".to_string())
            }
            other => AppError::Database(other),
        })?;

        Ok(invite)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Invite>> {
        let invite = sqlx::query_as::<_, Invite>("SELECT * FROM project_invites WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(invite)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Invite> {
        self.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// Pending invites addressed to `user_id`, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<InviteWithProject>> {
        let invites = sqlx::query_as::<_, InviteWithProject>(
            r#"
            SELECT i.id, i.project_id, p.name AS project_name,
                   i.invited_by, u.name AS inviter_name, i.created_at
            FROM project_invites i
            INNER JOIN projects p ON i.project_id = p.id
            INNER JOIN users u ON i.invited_by = u.id
            WHERE i.user_id = $1
            ORDER BY i.created_at DESC, i.rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(invites)
    }

    pub async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<InviteWithUser>> {
        let invites = sqlx::query_as::<_, InviteWithUser>(
            r#"
            SELECT i.id, i.user_id, u.name, u.email, i.created_at
            FROM project_invites i
            INNER JOIN users u ON i.user_id = u.id
            WHERE i.project_id = $1
            ORDER BY i.created_at ASC, i.rowid ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(invites)
    }

    /// Turn the invite into a membership. Both writes commit together.
    pub async fn accept(&self, invite: &Invite) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, created_at)
            VALUES ($1, $2, datetime('now'))
            ON CONFLICT(project_id, user_id) DO NOTHING
            "#,
        )
        .bind(invite.project_id)
        .bind(invite.user_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM project_invites WHERE id = $1")
            .bind(invite.id)
            .execute(&mut *tx)
            .await?;

        // declined or accepted by a concurrent request
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM project_invites WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::test_utils::{create_test_pool, create_test_user};

    #[tokio::test]
    async fn accept_adds_member_and_consumes_invite() {
        let state = AppState::new(create_test_pool().await);
        let leader = create_test_user(&state, "lead@example.com", "Lead").await;
        let guest = create_test_user(&state, "guest@example.com", "Guest").await;
        let project = state.projects.create("Apollo", "", leader).await.unwrap();

        let invite = state.invites.create(project.id, guest, leader).await.unwrap();
        assert_eq!(state.invites.list_for_user(guest).await.unwrap().len(), 1);

        state.invites.accept(&invite).await.unwrap();

        assert!(state.projects.is_member(project.id, guest).await.unwrap());
        assert!(state.invites.find_by_id(invite.id).await.unwrap().is_none());
        assert!(matches!(
            state.invites.accept(&invite).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn duplicate_invite_is_a_bad_request() {
        let state = AppState::new(create_test_pool().await);
        let leader = create_test_user(&state, "lead@example.com", "Lead").await;
        let guest = create_test_user(&state, "guest@example.com", "Guest").await;
        let project = state.projects.create("Apollo", "", leader).await.unwrap();

        state.invites.create(project.id, guest, leader).await.unwrap();
        let again = state.invites.create(project.id, guest, leader).await;

        assert!(matches!(again, Err(AppError::BadRequest(_))));
        assert_eq!(state.invites.list_for_project(project.id).await.unwrap().len(), 1);
    }
}
