use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{CreateTask, Task, TaskAssignee, TaskPriority, TaskStatus, UpdateTask};

#[derive(sqlx::FromRow)]
struct AssigneeRow {
    task_id: Uuid,
    #[sqlx(flatten)]
    assignee: TaskAssignee,
}

/// Replace the assignee set of a task inside the caller's transaction
async fn replace_assignees(conn: &mut SqliteConnection, task_id: Uuid, user_ids: &[Uuid]) -> Result<()> {
    sqlx::query("DELETE FROM task_assignees WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut *conn)
        .await?;

    for user_id in user_ids {
        sqlx::query(
            "INSERT INTO task_assignees (task_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(task_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[derive(Clone)]
pub struct TaskRepository {
    pool: Arc<SqlitePool>,
}

impl TaskRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, project_id: Uuid, created_by: Uuid, input: &CreateTask) -> Result<Task> {
        let id = Uuid::new_v4();
        let status = input.status.unwrap_or(TaskStatus::Todo);
        let priority = input.priority.unwrap_or(TaskPriority::Medium);

        let mut tx = self.pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, project_id, name, description, status, priority,
                               start_date, end_date, todos, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, datetime('now'), datetime('now'))
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(project_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(status.to_string())
        .bind(priority.to_string())
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(Json(&input.todos))
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        replace_assignees(&mut *tx, task.id, &input.assignee_ids).await?;

        tx.commit().await?;
        Ok(task)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(task)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Task> {
        self.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// Tasks of a project, optionally limited to one kanban status
    pub async fn list_by_project(&self, project_id: Uuid, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE project_id = $1 AND ($2 IS NULL OR status = $2)
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(project_id)
        .bind(status.map(|s| s.to_string()))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(tasks)
    }

    /// Tasks assigned to `user_id` in projects that are not archived
    pub async fn list_assigned_to(&self, user_id: Uuid) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.*
            FROM tasks t
            INNER JOIN task_assignees ta ON t.id = ta.task_id
            INNER JOIN projects p ON t.project_id = p.id
            WHERE ta.user_id = $1 AND p.archived = 0
            ORDER BY t.end_date IS NULL, t.end_date ASC, t.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(tasks)
    }

    /// Assignees of each task, keyed by task id. Tasks without any are absent.
    pub async fn assignees_for(&self, tasks: &[Task]) -> Result<HashMap<Uuid, Vec<TaskAssignee>>> {
        let mut by_task: HashMap<Uuid, Vec<TaskAssignee>> = HashMap::new();
        if tasks.is_empty() {
            return Ok(by_task);
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT ta.task_id, u.id AS user_id, u.name, u.email \
             FROM task_assignees ta INNER JOIN users u ON ta.user_id = u.id \
             WHERE ta.task_id IN (",
        );
        let mut ids = query.separated(", ");
        for task in tasks {
            ids.push_bind(task.id);
        }
        ids.push_unseparated(") ORDER BY u.name ASC");

        let rows = query
            .build_query_as::<AssigneeRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        for row in rows {
            by_task.entry(row.task_id).or_default().push(row.assignee);
        }
        Ok(by_task)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateTask) -> Result<Task> {
        let mut tx = self.pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                start_date = COALESCE($6, start_date),
                end_date = COALESCE($7, end_date),
                todos = COALESCE($8, todos),
                updated_at = datetime('now')
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.status.map(|s| s.to_string()))
        .bind(input.priority.map(|p| p.to_string()))
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.todos.as_ref().map(Json))
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound)?;

        if let Some(assignee_ids) = &input.assignee_ids {
            replace_assignees(&mut *tx, id, assignee_ids).await?;
        }

        tx.commit().await?;
        Ok(task)
    }

    /// Delete a task; its comments cascade
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
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
    use crate::models::TodoItem;
    use crate::state::AppState;
    use crate::test_utils::{create_test_pool, create_test_user};

    #[tokio::test]
    async fn assignees_and_todos_follow_updates() {
        let state = AppState::new(create_test_pool().await);
        let ada = create_test_user(&state, "ada@example.com", "Ada").await;
        let bob = create_test_user(&state, "bob@example.com", "Bob").await;
        let project = state.projects.create("P", "", ada).await.unwrap();

        let task = state
            .tasks
            .create(
                project.id,
                ada,
                &CreateTask {
                    name: "Ship".to_string(),
                    todos: vec![TodoItem {
                        name: "draft".to_string(),
                        completed: false,
                    }],
                    assignee_ids: vec![ada, ada],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(task.todos.0.len(), 1);

        let assignees = state.tasks.assignees_for(std::slice::from_ref(&task)).await.unwrap();
        assert_eq!(assignees[&task.id].len(), 1);

        let updated = state
            .tasks
            .update(
                task.id,
                &UpdateTask {
                    todos: Some(vec![]),
                    assignee_ids: Some(vec![bob]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.todos.0.is_empty());
        assert_eq!(updated.name, "Ship");

        let assignees = state.tasks.assignees_for(&[updated]).await.unwrap();
        assert_eq!(assignees[&task.id][0].user_id, bob);
        assert!(state.tasks.list_assigned_to(ada).await.unwrap().is_empty());
        assert_eq!(state.tasks.list_assigned_to(bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn archived_projects_drop_out_of_assigned_tasks() {
        let state = AppState::new(create_test_pool().await);
        let ada = create_test_user(&state, "ada@example.com", "Ada").await;
        let project = state.projects.create("P", "", ada).await.unwrap();
        state
            .tasks
            .create(
                project.id,
                ada,
                &CreateTask {
                    name: "Ship".to_string(),
                    assignee_ids: vec![ada],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(state.tasks.list_assigned_to(ada).await.unwrap().len(), 1);

        state.projects.set_archived(project.id, true).await.unwrap();
        assert!(state.tasks.list_assigned_to(ada).await.unwrap().is_empty());
    }
}
