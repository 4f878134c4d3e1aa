use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use crate::comments::store::CommentStore;
use crate::comments::tree::CommentTree;
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentKind, CommentWithAuthor, NewComment};

/// Comment rows for one [`CommentKind`], in `task_comments` or `post_comments`.
#[derive(Clone)]
pub struct SqliteCommentStore {
    pool: Arc<SqlitePool>,
    kind: CommentKind,
}

impl SqliteCommentStore {
    pub fn new(pool: Arc<SqlitePool>, kind: CommentKind) -> Self {
        Self { pool, kind }
    }

    fn columns(&self) -> String {
        format!(
            "id, {} AS container_id, author_id, parent_comment_id, content, created_at",
            self.kind.container_column()
        )
    }

    fn subtree_sql(&self) -> String {
        format!(
            r#"
            WITH RECURSIVE subtree(id) AS (
                SELECT id FROM {table} WHERE id = $1
                UNION
                SELECT c.id FROM {table} c INNER JOIN subtree s ON c.parent_comment_id = s.id
            )
            SELECT {columns} FROM {table}
            WHERE id IN (SELECT id FROM subtree)
            ORDER BY created_at ASC, rowid ASC
            "#,
            table = self.kind.table(),
            columns = self.columns(),
        )
    }

    /// Count comments in a container
    pub async fn count_for_container(&self, container_id: Uuid) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            self.kind.table(),
            self.kind.container_column()
        );

        let count: (i64,) = sqlx::query_as(&sql)
            .bind(container_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count.0)
    }
}

/// Delete `ids` one by one, in order, on an open transaction.
async fn delete_rows(conn: &mut SqliteConnection, table: &str, ids: &[Uuid]) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE id = $1", table);

    for id in ids {
        let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::Internal(format!(
                "comment {} vanished inside its delete transaction",
                id
            )));
        }
    }

    Ok(())
}

#[async_trait]
impl CommentStore for SqliteCommentStore {
    fn kind(&self) -> CommentKind {
        self.kind
    }

    async fn create(&self, new: NewComment) -> Result<Comment> {
        let id = Uuid::new_v4();
        let sql = format!(
            r#"
            INSERT INTO {table} (id, {container}, author_id, parent_comment_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5, datetime('now'))
            RETURNING {columns}
            "#,
            table = self.kind.table(),
            container = self.kind.container_column(),
            columns = self.columns(),
        );

        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .bind(new.container_id)
            .bind(new.author_id)
            .bind(new.parent_comment_id)
            .bind(&new.content)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| match e {
                // the parent was deleted after the service checked it
                sqlx::Error::Database(ref db)
                    if db.is_foreign_key_violation() && new.parent_comment_id.is_some() =>
                {
                    AppError::Validation("Parent comment does not exist".to_string())
                }
                e => AppError::Database(e),
            })?;

        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            self.columns(),
            self.kind.table()
        );

        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(comment)
    }

    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE parent_comment_id = $1 ORDER BY created_at ASC, rowid ASC",
            self.columns(),
            self.kind.table()
        );

        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(parent_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(comments)
    }

    async fn find_all_for_container(&self, container_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let sql = format!(
            r#"
            SELECT c.id, c.{container} AS container_id, c.author_id, c.parent_comment_id,
                   c.content, c.created_at, u.name AS author_name
            FROM {table} c
            INNER JOIN users u ON c.author_id = u.id
            WHERE c.{container} = $1
            ORDER BY c.created_at ASC, c.rowid ASC
            "#,
            container = self.kind.container_column(),
            table = self.kind.table(),
        );

        let comments = sqlx::query_as::<_, CommentWithAuthor>(&sql)
            .bind(container_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(comments)
    }

    async fn find_subtree(&self, root: Uuid) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&self.subtree_sql())
            .bind(root)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(comments)
    }

    async fn delete_subtree(&self, root: Uuid) -> Result<Vec<Uuid>> {
        // IMMEDIATE takes the write lock before the subtree is read, so no
        // reply can slip in between the read and the deletes.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let subtree = sqlx::query_as::<_, Comment>(&self.subtree_sql())
            .bind(root)
            .fetch_all(&mut *tx)
            .await?;
        if subtree.is_empty() {
            return Err(AppError::NotFound);
        }

        let order = CommentTree::build(&subtree).post_order(root);
        // dropping `tx` on error rolls back everything deleted so far
        delete_rows(&mut *tx, self.kind.table(), &order).await?;

        tx.commit().await?;
        Ok(order)
    }
}
