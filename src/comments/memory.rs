use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::comments::store::CommentStore;
use crate::comments::tree::CommentTree;
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentKind, CommentWithAuthor, NewComment};

#[derive(Default)]
struct Inner {
    rows: Vec<Comment>,
    delete_log: Vec<Uuid>,
    fail_on: Option<Uuid>,
}

/// In-process store that records every delete it applies.
///
/// `fail_deletes_at` makes the next `delete_subtree` touching that id fail
/// without changing anything, which lets callers check that a subtree
/// delete never half-applies. There is no user table, so listed author
/// names are the author ids.
pub struct MemoryCommentStore {
    kind: CommentKind,
    inner: Mutex<Inner>,
}

impl MemoryCommentStore {
    pub fn new(kind: CommentKind) -> Self {
        Self {
            kind,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub async fn delete_log(&self) -> Vec<Uuid> {
        self.inner.lock().await.delete_log.clone()
    }

    pub async fn fail_deletes_at(&self, id: Uuid) {
        self.inner.lock().await.fail_on = Some(id);
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    fn kind(&self) -> CommentKind {
        self.kind
    }

    async fn create(&self, new: NewComment) -> Result<Comment> {
        let mut inner = self.inner.lock().await;
        // mirrors the parent foreign key of the SQL schema
        if let Some(parent) = new.parent_comment_id {
            if !inner.rows.iter().any(|c| c.id == parent) {
                return Err(AppError::Internal(format!(
                    "parent comment {} does not exist",
                    parent
                )));
            }
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            container_id: new.container_id,
            author_id: new.author_id,
            parent_comment_id: new.parent_comment_id,
            content: new.content,
            created_at: Utc::now(),
        };
        inner.rows.push(comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.iter().find(|c| c.id == id).cloned())
    }

    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<Comment>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .rows
            .iter()
            .filter(|c| c.parent_comment_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn find_all_for_container(&self, container_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .rows
            .iter()
            .filter(|c| c.container_id == container_id)
            .map(|c| CommentWithAuthor {
                id: c.id,
                container_id: c.container_id,
                author_id: c.author_id,
                parent_comment_id: c.parent_comment_id,
                content: c.content.clone(),
                created_at: c.created_at,
                author_name: c.author_id.to_string(),
            })
            .collect())
    }

    async fn delete_subtree(&self, root: Uuid) -> Result<Vec<Uuid>> {
        // one lock for the read and the deletes
        let mut inner = self.inner.lock().await;

        let mut subtree: Vec<Comment> = Vec::new();
        let mut frontier = vec![root];
        while let Some(id) = frontier.pop() {
            for comment in inner.rows.iter().filter(|c| c.id == id) {
                subtree.push(comment.clone());
            }
            frontier.extend(
                inner
                    .rows
                    .iter()
                    .filter(|c| c.parent_comment_id == Some(id))
                    .map(|c| c.id),
            );
        }
        if subtree.is_empty() {
            return Err(AppError::NotFound);
        }

        let order = CommentTree::build(&subtree).post_order(root);

        if let Some(fail_on) = inner.fail_on {
            if order.contains(&fail_on) {
                inner.fail_on = None;
                return Err(AppError::Internal(format!(
                    "injected failure deleting comment {}",
                    fail_on
                )));
            }
        }

        // mirrors the parent foreign key: a row may only go once it has no replies
        let mut remaining = inner.rows.clone();
        for id in &order {
            if remaining.iter().any(|c| c.parent_comment_id == Some(*id)) {
                return Err(AppError::Internal(format!(
                    "comment {} still has replies",
                    id
                )));
            }
            remaining.retain(|c| c.id != *id);
        }

        inner.rows = remaining;
        inner.delete_log.extend_from_slice(&order);
        Ok(order)
    }
}
