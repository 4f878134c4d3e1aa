use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Post, PostSummary};

#[derive(Clone)]
pub struct PostRepository {
    pool: Arc<SqlitePool>,
}

impl PostRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, project_id: Uuid, author_id: Uuid, title: &str, content: &str) -> Result<Post> {
        let id = Uuid::new_v4();

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, project_id, author_id, title, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, datetime('now'), datetime('now'))
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(project_id)
        .bind(author_id)
        .bind(title)
        .bind(content)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(post)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(post)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Post> {
        self.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// Posts of a project with author name and comment count, newest first
    pub async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<PostSummary>> {
        let posts = sqlx::query_as::<_, PostSummary>(
            r#"
            SELECT p.id, p.project_id, p.author_id, u.name AS author_name, p.title, p.content,
                   (SELECT COUNT(*) FROM post_comments c WHERE c.post_id = p.id) AS comment_count,
                   p.created_at, p.updated_at
            FROM posts p
            INNER JOIN users u ON p.author_id = u.id
            WHERE p.project_id = $1
            ORDER BY p.created_at DESC, p.rowid DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(posts)
    }

    /// Delete a post; its comment threads cascade
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
