use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::comments::tree::{ThreadNode, Threaded};

/// Which container a comment hangs off. Task comments are flat, post comments nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    Task,
    Post,
}

impl std::fmt::Display for CommentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommentKind::Task => write!(f, "task"),
            CommentKind::Post => write!(f, "post"),
        }
    }
}

impl CommentKind {
    pub fn table(&self) -> &'static str {
        match self {
            CommentKind::Task => "task_comments",
            CommentKind::Post => "post_comments",
        }
    }

    pub fn container_column(&self) -> &'static str {
        match self {
            CommentKind::Task => "task_id",
            CommentKind::Post => "post_id",
        }
    }

    pub fn allows_replies(&self) -> bool {
        matches!(self, CommentKind::Post)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub container_id: Uuid,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Threaded for Comment {
    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_comment_id
    }
}

/// Row to insert; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub container_id: Uuid,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
}

/// Comment with author info joined from users table
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub container_id: Uuid,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author_name: String,
}

impl Threaded for CommentWithAuthor {
    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_comment_id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub container_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(c: CommentWithAuthor) -> Self {
        Self {
            id: c.id,
            container_id: c.container_id,
            author_id: c.author_id,
            author_name: c.author_name,
            parent_comment_id: c.parent_comment_id,
            content: c.content,
            created_at: c.created_at,
        }
    }
}

impl Comment {
    pub fn into_response(self, author_name: String) -> CommentResponse {
        CommentResponse {
            id: self.id,
            container_id: self.container_id,
            author_id: self.author_id,
            author_name,
            parent_comment_id: self.parent_comment_id,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteCommentResponse {
    /// Removed ids, replies before the comments they answer.
    pub deleted: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CommentThreadResponse {
    pub comments: Vec<ThreadNode<CommentResponse>>,
    pub orphan_ids: Vec<Uuid>,
}
